//! Reservation domain types.
//!
//! A reservation owns its client snapshot, its stay dates and its payment
//! ledger. Aggregate fields (`total_price`, `amount_paid`, `paid`) are always
//! recomputed from their sources, never set directly by callers.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use innkeep_shared::types::{Money, PaymentId, ReservationId, RoomId, UserId};
use serde::{Deserialize, Serialize};

use crate::payment::types::PaymentEntry;
use crate::reservation::error::ReservationError;

/// Reservation status.
///
/// The valid transitions are:
/// - Pending → Confirmed (confirm)
/// - Pending | Confirmed → InProgress (check in)
/// - InProgress → Finished (check out)
/// - Pending | Confirmed | InProgress → Cancelled (cancel)
/// - Pending | Confirmed → NoShow (mark no-show)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Booked but not yet confirmed.
    Pending,
    /// Booked and confirmed.
    Confirmed,
    /// Guest has checked in.
    InProgress,
    /// Guest has checked out.
    Finished,
    /// Reservation was cancelled.
    Cancelled,
    /// Guest never arrived; the slot stays held.
    NoShow,
}

impl ReservationStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::InProgress,
        Self::Finished,
        Self::Cancelled,
        Self::NoShow,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "in_progress" => Some(Self::InProgress),
            "finished" => Some(Self::Finished),
            "cancelled" => Some(Self::Cancelled),
            "no_show" => Some(Self::NoShow),
            _ => None,
        }
    }

    /// Returns true if no further status transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled | Self::NoShow)
    }

    /// Returns true if the reservation still holds its room for conflict checks.
    #[must_use]
    pub const fn holds_room(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Returns true if the guest has not arrived yet.
    #[must_use]
    pub const fn is_upcoming(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Point-in-time copy of the guest's details.
///
/// Copied into the reservation at booking time so later edits to the client
/// record never alter past bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Identity document number.
    pub document: Option<String>,
}

impl ClientSnapshot {
    /// Returns "name surname".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }

    /// Checks required fields and the email shape.
    pub fn validate(&self) -> Result<(), ReservationError> {
        if self.name.trim().is_empty() {
            return Err(ReservationError::validation("client.name", "is required"));
        }
        if self.surname.trim().is_empty() {
            return Err(ReservationError::validation("client.surname", "is required"));
        }
        if let Some(email) = &self.email {
            let valid = email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if !valid {
                return Err(ReservationError::validation(
                    "client.email",
                    format!("'{email}' is not a valid address"),
                ));
            }
        }
        Ok(())
    }
}

/// A half-open stay `[check_in, check_out)`.
///
/// The check-out day itself is not occupied, so a stay ending on the 15th and
/// another starting on the 15th do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawStay")]
pub struct StayDates {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

#[derive(Deserialize)]
struct RawStay {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl TryFrom<RawStay> for StayDates {
    type Error = ReservationError;

    fn try_from(raw: RawStay) -> Result<Self, Self::Error> {
        Self::new(raw.check_in, raw.check_out)
    }
}

impl StayDates {
    /// Creates a stay, rejecting `check_out <= check_in`.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, ReservationError> {
        if check_out <= check_in {
            return Err(ReservationError::validation(
                "check_out",
                format!("{check_out} must be after check-in {check_in}"),
            ));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// First night of the stay.
    #[must_use]
    pub const fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    /// Departure day (not occupied).
    #[must_use]
    pub const fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights, always at least one.
    #[must_use]
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Half-open interval overlap test.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.check_in < other.check_out && self.check_out > other.check_in
    }

    /// Returns true if the night starting on `date` belongs to the stay.
    #[must_use]
    pub fn covers_night(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }
}

impl fmt::Display for StayDates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.check_in, self.check_out)
    }
}

/// A room booking with its payment ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique identifier.
    pub id: ReservationId,
    /// Guest details as of booking time.
    pub client: ClientSnapshot,
    /// Booked room.
    pub room_id: RoomId,
    /// Stay dates.
    pub stay: StayDates,
    /// Nightly rate.
    pub price_per_night: Money,
    /// `nights × price_per_night`.
    pub total_price: Money,
    /// Current status.
    pub status: ReservationStatus,
    /// Payment ledger in insertion order.
    pub payments: Vec<PaymentEntry>,
    /// Sum of all ledger amounts.
    pub amount_paid: Money,
    /// `amount_paid >= total_price`.
    pub paid: bool,
    /// Set by check-in.
    pub check_in_at: Option<DateTime<Utc>>,
    /// Set by check-out.
    pub check_out_at: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Staff member who made the booking.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency version, bumped by every persisted write.
    pub version: i64,
}

impl Reservation {
    /// Number of nights booked.
    #[must_use]
    pub fn nights(&self) -> i64 {
        self.stay.nights()
    }

    /// `total_price - amount_paid`; negative only after a refund overshoot.
    #[must_use]
    pub fn remaining(&self) -> Money {
        self.total_price - self.amount_paid
    }

    /// Outstanding balance, never below zero.
    #[must_use]
    pub fn balance_due(&self) -> Money {
        self.remaining().clamp_non_negative()
    }

    /// Sum of every ledger entry.
    #[must_use]
    pub fn ledger_total(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Returns true if `amount_paid` matches the ledger.
    #[must_use]
    pub fn is_ledger_consistent(&self) -> bool {
        self.amount_paid == self.ledger_total()
    }

    /// Finds a ledger entry by id.
    #[must_use]
    pub fn payment(&self, payment_id: PaymentId) -> Option<&PaymentEntry> {
        self.payments.iter().find(|p| p.id == payment_id)
    }

    /// Re-derives `amount_paid` and `paid` from the ledger.
    pub(crate) fn sync_payment_totals(&mut self) {
        self.amount_paid = self.ledger_total();
        self.paid = self.amount_paid >= self.total_price;
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
