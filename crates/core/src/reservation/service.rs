//! Reservation creation and updates.
//!
//! Both paths validate the input, price the stay and run the conflict check
//! against the caller-supplied slots before building or mutating anything.

use chrono::{DateTime, NaiveDate, Utc};
use innkeep_shared::config::BookingConfig;
use innkeep_shared::types::{Money, ReservationId, RoomId, UserId};

use crate::availability::conflict::{BookedSlot, ConflictChecker};
use crate::reservation::error::ReservationError;
use crate::reservation::types::{ClientSnapshot, Reservation, ReservationStatus, StayDates};

/// Rules applied to every booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    /// Start new reservations as Confirmed instead of Pending.
    pub confirm_on_create: bool,
    /// Longest stay accepted, in nights.
    pub max_stay_nights: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self::from(&BookingConfig::default())
    }
}

impl From<&BookingConfig> for BookingPolicy {
    fn from(config: &BookingConfig) -> Self {
        Self {
            confirm_on_create: config.confirm_on_create,
            max_stay_nights: config.max_stay_nights,
        }
    }
}

impl BookingPolicy {
    /// Status given to a freshly created reservation.
    #[must_use]
    pub const fn initial_status(&self) -> ReservationStatus {
        if self.confirm_on_create {
            ReservationStatus::Confirmed
        } else {
            ReservationStatus::Pending
        }
    }

    fn check_length(&self, stay: &StayDates) -> Result<(), ReservationError> {
        if stay.nights() > i64::from(self.max_stay_nights) {
            return Err(ReservationError::validation(
                "check_out",
                format!(
                    "stay of {} nights exceeds the maximum of {}",
                    stay.nights(),
                    self.max_stay_nights
                ),
            ));
        }
        Ok(())
    }
}

/// Input for a new booking.
#[derive(Debug, Clone)]
pub struct NewReservation {
    /// Guest details to snapshot.
    pub client: ClientSnapshot,
    /// Requested room.
    pub room_id: RoomId,
    /// First night.
    pub check_in: NaiveDate,
    /// Departure day.
    pub check_out: NaiveDate,
    /// Nightly rate.
    pub price_per_night: Money,
    /// Staff member booking it.
    pub created_by: UserId,
    /// Optional notes.
    pub notes: Option<String>,
}

/// Partial update of a reservation; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ReservationUpdate {
    /// Replacement guest details.
    pub client: Option<ClientSnapshot>,
    /// Move to another room.
    pub room_id: Option<RoomId>,
    /// New first night.
    pub check_in: Option<NaiveDate>,
    /// New departure day.
    pub check_out: Option<NaiveDate>,
    /// New nightly rate.
    pub price_per_night: Option<Money>,
    /// Replacement notes; a blank string clears them.
    pub notes: Option<String>,
}

impl ReservationUpdate {
    /// Room the reservation will occupy after the update.
    #[must_use]
    pub fn target_room(&self, current: RoomId) -> RoomId {
        self.room_id.unwrap_or(current)
    }

    /// Returns true if the update can move the reservation in the calendar.
    #[must_use]
    pub const fn touches_availability(&self) -> bool {
        self.room_id.is_some() || self.check_in.is_some() || self.check_out.is_some()
    }
}

/// Stateless service for creating and updating reservations.
pub struct ReservationService;

impl ReservationService {
    /// Price of a stay: `nights × price_per_night`.
    ///
    /// # Errors
    ///
    /// `Validation` if the rate is not positive or the total overflows.
    pub fn quote(stay: &StayDates, price_per_night: Money) -> Result<Money, ReservationError> {
        if !price_per_night.is_positive() {
            return Err(ReservationError::validation(
                "price_per_night",
                format!("{price_per_night} must be greater than zero"),
            ));
        }
        price_per_night
            .checked_mul(stay.nights())
            .ok_or_else(|| ReservationError::validation("price_per_night", "total price overflows"))
    }

    /// Build a new reservation.
    ///
    /// `slots` are the existing bookings of the room around the requested
    /// dates; any other rooms or cancelled bookings among them are ignored.
    ///
    /// # Errors
    ///
    /// - `Validation` for a bad client, stay or rate
    /// - `Conflict` if the room is taken for part of the stay
    pub fn create(
        input: NewReservation,
        policy: &BookingPolicy,
        slots: &[BookedSlot],
        now: DateTime<Utc>,
    ) -> Result<Reservation, ReservationError> {
        // 1. Validate input
        input.client.validate()?;
        let stay = StayDates::new(input.check_in, input.check_out)?;
        policy.check_length(&stay)?;
        let total_price = Self::quote(&stay, input.price_per_night)?;

        // 2. Availability
        ConflictChecker::ensure_available(slots, input.room_id, &stay, None)?;

        Ok(Reservation {
            id: ReservationId::new(),
            client: input.client,
            room_id: input.room_id,
            stay,
            price_per_night: input.price_per_night,
            total_price,
            status: policy.initial_status(),
            payments: Vec::new(),
            amount_paid: Money::ZERO,
            paid: false,
            check_in_at: None,
            check_out_at: None,
            notes: normalize_notes(input.notes),
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    /// Apply a partial update.
    ///
    /// An in-house stay may still be extended, shortened or repriced, but it
    /// cannot change room or check-in date. The new total must still cover
    /// what was already paid.
    ///
    /// # Errors
    ///
    /// - `OperationNotAllowed` for terminal reservations or in-house moves
    /// - `Validation` for a bad client, stay or rate
    /// - `LimitExceeded` if the new total is below the amount paid
    /// - `Conflict` if the new room or dates are taken
    pub fn apply_update(
        reservation: &mut Reservation,
        update: ReservationUpdate,
        policy: &BookingPolicy,
        slots: &[BookedSlot],
        now: DateTime<Utc>,
    ) -> Result<(), ReservationError> {
        let status = reservation.status;
        if status.is_terminal() {
            return Err(ReservationError::OperationNotAllowed {
                operation: "update",
                status,
            });
        }

        let room_id = update.target_room(reservation.room_id);
        let check_in = update.check_in.unwrap_or(reservation.stay.check_in());
        let check_out = update.check_out.unwrap_or(reservation.stay.check_out());

        if status == ReservationStatus::InProgress
            && (room_id != reservation.room_id || check_in != reservation.stay.check_in())
        {
            return Err(ReservationError::OperationNotAllowed {
                operation: "change the room or check-in date",
                status,
            });
        }

        if let Some(client) = &update.client {
            client.validate()?;
        }
        let stay = StayDates::new(check_in, check_out)?;
        policy.check_length(&stay)?;
        let price_per_night = update.price_per_night.unwrap_or(reservation.price_per_night);
        let total_price = Self::quote(&stay, price_per_night)?;

        if total_price < reservation.amount_paid {
            return Err(ReservationError::LimitExceeded {
                attempted: reservation.amount_paid,
                available: total_price,
            });
        }

        if room_id != reservation.room_id || stay != reservation.stay {
            ConflictChecker::ensure_available(slots, room_id, &stay, Some(reservation.id))?;
        }

        if let Some(client) = update.client {
            reservation.client = client;
        }
        if let Some(notes) = update.notes {
            reservation.notes = normalize_notes(Some(notes));
        }
        reservation.room_id = room_id;
        reservation.stay = stay;
        reservation.price_per_night = price_per_night;
        reservation.total_price = total_price;
        reservation.sync_payment_totals();
        reservation.touch(now);

        Ok(())
    }
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}
