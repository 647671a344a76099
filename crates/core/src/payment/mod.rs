//! Payment ledger.
//!
//! # Modules
//!
//! - `types` - Entries, inputs and change records
//! - `ledger` - Add/edit/delete/recalculate with status gates and ceilings

pub mod ledger;
pub mod types;

#[cfg(test)]
mod ledger_props;

pub use ledger::PaymentLedger;
pub use types::{
    EditAudit, LedgerChange, NewPayment, PaymentEdit, PaymentEntry, PaymentKind, PaymentMethod,
};
