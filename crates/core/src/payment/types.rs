//! Payment ledger types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use innkeep_shared::types::{Money, PaymentId, UserId};
use serde::{Deserialize, Serialize};

/// How a payment was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash at the desk.
    Cash,
    /// Debit or credit card.
    Card,
    /// Bank transfer.
    BankTransfer,
    /// Anything else.
    Other,
}

impl PaymentMethod {
    /// Returns the string representation of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "bank_transfer" | "transfer" => Ok(Self::BankTransfer),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown payment method: {s}")),
        }
    }
}

/// Whether an entry is a guest payment or a refund posted on cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Money received (positive amount).
    Payment,
    /// Money returned (negative amount).
    Refund,
}

impl PaymentKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Refund => "refund",
        }
    }
}

/// Audit trail stamped on an entry that was edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditAudit {
    /// Who edited the entry.
    pub edited_by: UserId,
    /// When the entry was edited.
    pub edited_at: DateTime<Utc>,
    /// Why the entry was edited.
    pub reason: String,
}

/// One monetary movement on a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEntry {
    /// Unique identifier.
    pub id: PaymentId,
    /// Payment or refund.
    pub kind: PaymentKind,
    /// Signed amount; never zero.
    pub amount: Money,
    /// Method used.
    pub method: PaymentMethod,
    /// Optional free text.
    pub note: Option<String>,
    /// When the money moved.
    pub recorded_at: DateTime<Utc>,
    /// Who recorded it.
    pub recorded_by: UserId,
    /// Present only if the entry was edited.
    pub edit: Option<EditAudit>,
}

impl PaymentEntry {
    /// Returns true for refund entries.
    #[must_use]
    pub fn is_refund(&self) -> bool {
        self.kind == PaymentKind::Refund
    }
}

/// Input for recording a payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    /// Amount received, must be positive.
    pub amount: Money,
    /// Method used.
    pub method: PaymentMethod,
    /// Who is recording it.
    pub recorded_by: UserId,
    /// Optional free text.
    pub note: Option<String>,
    /// Defaults to now.
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Input for editing a payment; `None` fields are left untouched.
#[derive(Debug, Clone)]
pub struct PaymentEdit {
    /// Replacement amount.
    pub amount: Option<Money>,
    /// Replacement method.
    pub method: Option<PaymentMethod>,
    /// Replacement note.
    pub note: Option<String>,
    /// Replacement timestamp.
    pub recorded_at: Option<DateTime<Utc>>,
    /// Who is editing.
    pub edited_by: UserId,
    /// Why; required.
    pub reason: String,
}

/// What a ledger operation changed, for the persistence layer to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerChange {
    /// An entry was appended.
    Added(PaymentEntry),
    /// An entry was modified in place.
    Edited {
        /// The entry before the edit.
        before: PaymentEntry,
        /// The entry after the edit.
        after: PaymentEntry,
    },
    /// An entry was removed.
    Deleted {
        /// The removed entry.
        entry: PaymentEntry,
        /// Who removed it.
        deleted_by: UserId,
    },
    /// Aggregates were re-derived from the ledger.
    Recalculated {
        /// `amount_paid` before.
        previous: Money,
        /// `amount_paid` after.
        current: Money,
    },
}

impl LedgerChange {
    /// The entry touched by this change, if any.
    #[must_use]
    pub fn entry(&self) -> Option<&PaymentEntry> {
        match self {
            Self::Added(entry) | Self::Edited { after: entry, .. } | Self::Deleted { entry, .. } => {
                Some(entry)
            }
            Self::Recalculated { .. } => None,
        }
    }
}
