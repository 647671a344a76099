//! Cancellation audit records.

use std::fmt;

use chrono::{DateTime, Utc};
use innkeep_shared::types::{CancellationId, Money, PaymentId, ReservationId, RoomId, UserId};
use serde::{Deserialize, Serialize};

use crate::payment::types::{PaymentEntry, PaymentMethod};
use crate::reservation::types::{ClientSnapshot, Reservation, ReservationStatus, StayDates};
use crate::status::types::StatusTransition;

/// Refund progress of a cancellation.
///
/// The valid transitions are:
/// - Pending → Processed (process refund)
/// - Processed → Completed (complete refund)
/// - Pending → Rejected (reject refund)
///
/// NotApplicable is assigned when nothing was paid and never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    /// Nothing was paid, so nothing is owed.
    NotApplicable,
    /// Money is owed to the guest.
    Pending,
    /// The refund was posted to the ledger.
    Processed,
    /// The guest received the money.
    Completed,
    /// The refund was declined.
    Rejected,
}

impl RefundStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotApplicable => "not_applicable",
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "not_applicable" => Some(Self::NotApplicable),
            "pending" => Some(Self::Pending),
            "processed" => Some(Self::Processed),
            "completed" => Some(Self::Completed),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if no further refund step is possible.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::NotApplicable | Self::Completed | Self::Rejected)
    }
}

impl fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The reservation as it was when it got cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationSnapshot {
    /// Guest details.
    pub client: ClientSnapshot,
    /// Booked room.
    pub room_id: RoomId,
    /// Stay dates.
    pub stay: StayDates,
    /// Nightly rate.
    pub price_per_night: Money,
    /// Total price.
    pub total_price: Money,
    /// Amount paid at cancellation time.
    pub amount_paid: Money,
    /// Status the reservation left.
    pub status_at_cancellation: ReservationStatus,
    /// Ledger at cancellation time.
    pub payments: Vec<PaymentEntry>,
}

impl From<&Reservation> for ReservationSnapshot {
    fn from(reservation: &Reservation) -> Self {
        Self {
            client: reservation.client.clone(),
            room_id: reservation.room_id,
            stay: reservation.stay,
            price_per_night: reservation.price_per_night,
            total_price: reservation.total_price,
            amount_paid: reservation.amount_paid,
            status_at_cancellation: reservation.status,
            payments: reservation.payments.clone(),
        }
    }
}

/// Details recorded once a refund is processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundDetails {
    /// Refunded amount (positive).
    pub amount: Money,
    /// How the money went back.
    pub method: PaymentMethod,
    /// Who processed it.
    pub processed_by: UserId,
    /// When it was processed.
    pub processed_at: DateTime<Utc>,
    /// Optional free text.
    pub note: Option<String>,
    /// The negative ledger entry posted on the reservation.
    pub payment_id: PaymentId,
}

/// Audit record of a cancellation.
///
/// Apart from the refund fields, a record never changes after creation and
/// never re-reads the live reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRecord {
    /// Unique identifier.
    pub id: CancellationId,
    /// The cancelled reservation.
    pub reservation_id: ReservationId,
    /// The reservation as of cancellation.
    pub snapshot: ReservationSnapshot,
    /// Why it was cancelled.
    pub reason: String,
    /// Who cancelled it.
    pub cancelled_by: UserId,
    /// When it was cancelled.
    pub cancelled_at: DateTime<Utc>,
    /// Refund progress.
    pub refund_status: RefundStatus,
    /// Set once processed.
    pub refund: Option<RefundDetails>,
    /// Who confirmed the guest got the money.
    pub completed_by: Option<UserId>,
    /// When the refund was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Who declined the refund.
    pub rejected_by: Option<UserId>,
    /// When the refund was declined.
    pub rejected_at: Option<DateTime<Utc>>,
    /// Why the refund was declined.
    pub rejection_reason: Option<String>,
    /// Optimistic concurrency version.
    pub version: i64,
}

impl CancellationRecord {
    /// Amount owed to the guest.
    #[must_use]
    pub fn refundable_amount(&self) -> Money {
        self.snapshot.amount_paid.clamp_non_negative()
    }
}

/// Result of cancelling a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationOutcome {
    /// The new audit record.
    pub record: CancellationRecord,
    /// The status change applied to the reservation.
    pub transition: StatusTransition,
}

/// Result of processing a refund: both aggregates changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundPosting {
    /// The refund details now on the record.
    pub details: RefundDetails,
    /// The negative entry now on the reservation's ledger.
    pub entry: PaymentEntry,
}
