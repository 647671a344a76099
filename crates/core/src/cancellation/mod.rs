//! Cancellations and refunds.
//!
//! # Modules
//!
//! - `types` - Cancellation records, snapshots and refund status
//! - `workflow` - Cancel, process, complete and reject refunds

pub mod types;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use types::{
    CancellationOutcome, CancellationRecord, RefundDetails, RefundPosting, RefundStatus,
    ReservationSnapshot,
};
pub use workflow::CancellationWorkflow;
