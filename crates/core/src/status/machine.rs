//! Reservation status state machine.
//!
//! Every transition validates the current status, stamps the aggregate and
//! returns a [`StatusTransition`]. The machine also answers which payment
//! operations a status permits.

use chrono::{DateTime, Utc};

use crate::reservation::error::ReservationError;
use crate::reservation::types::{Reservation, ReservationStatus};
use crate::status::types::{RoomEvent, StatusTransition};

/// Stateless service for reservation status transitions.
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Pending → Confirmed
    /// - Pending | Confirmed → InProgress | Cancelled | NoShow
    /// - InProgress → Finished | Cancelled
    #[must_use]
    pub fn is_valid_transition(from: ReservationStatus, to: ReservationStatus) -> bool {
        use crate::reservation::types::ReservationStatus::{
            Cancelled, Confirmed, Finished, InProgress, NoShow, Pending,
        };

        matches!(
            (from, to),
            (Pending, Confirmed)
                | (Pending | Confirmed, InProgress | Cancelled | NoShow)
                | (InProgress, Finished | Cancelled)
        )
    }

    fn ensure_transition(
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<(), ReservationError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(ReservationError::InvalidTransition { from, to })
        }
    }

    /// Confirm a pending booking.
    pub fn confirm(
        reservation: &mut Reservation,
        now: DateTime<Utc>,
    ) -> Result<StatusTransition, ReservationError> {
        Self::transition(reservation, ReservationStatus::Confirmed, now, None)
    }

    /// Check the guest in.
    ///
    /// Legal from Pending or Confirmed. Records `check_in_at` and emits
    /// [`RoomEvent::Occupied`].
    pub fn check_in(
        reservation: &mut Reservation,
        at: Option<DateTime<Utc>>,
    ) -> Result<StatusTransition, ReservationError> {
        let at = at.unwrap_or_else(Utc::now);
        let event = RoomEvent::Occupied {
            room_id: reservation.room_id,
            reservation_id: reservation.id,
            at,
        };
        let transition =
            Self::transition(reservation, ReservationStatus::InProgress, at, Some(event))?;
        reservation.check_in_at = Some(at);
        Ok(transition)
    }

    /// Check the guest out.
    ///
    /// Legal from InProgress only. Records `check_out_at` and emits
    /// [`RoomEvent::Freed`].
    pub fn check_out(
        reservation: &mut Reservation,
        at: Option<DateTime<Utc>>,
    ) -> Result<StatusTransition, ReservationError> {
        let at = at.unwrap_or_else(Utc::now);
        Self::ensure_transition(reservation.status, ReservationStatus::Finished)?;
        if let Some(checked_in) = reservation.check_in_at {
            if at < checked_in {
                return Err(ReservationError::validation(
                    "check_out_at",
                    format!("{at} is before check-in at {checked_in}"),
                ));
            }
        }

        let event = RoomEvent::Freed {
            room_id: reservation.room_id,
            reservation_id: reservation.id,
            at,
        };
        let transition =
            Self::transition(reservation, ReservationStatus::Finished, at, Some(event))?;
        reservation.check_out_at = Some(at);
        Ok(transition)
    }

    /// Mark a guest who never arrived.
    ///
    /// The reservation keeps holding its slot for conflict checks.
    pub fn mark_no_show(
        reservation: &mut Reservation,
        now: DateTime<Utc>,
    ) -> Result<StatusTransition, ReservationError> {
        Self::transition(reservation, ReservationStatus::NoShow, now, None)
    }

    /// Move to Cancelled; frees the room if the guest was in-house.
    ///
    /// Only reachable through the cancellation workflow so that every
    /// cancellation leaves an audit record.
    pub(crate) fn cancel(
        reservation: &mut Reservation,
        now: DateTime<Utc>,
    ) -> Result<StatusTransition, ReservationError> {
        let event = (reservation.status == ReservationStatus::InProgress).then_some(
            RoomEvent::Freed {
                room_id: reservation.room_id,
                reservation_id: reservation.id,
                at: now,
            },
        );
        Self::transition(reservation, ReservationStatus::Cancelled, now, event)
    }

    /// Validates that the reservation may be cancelled.
    pub fn ensure_can_cancel(status: ReservationStatus) -> Result<(), ReservationError> {
        Self::ensure_transition(status, ReservationStatus::Cancelled)
    }

    /// Validates that a new payment may be recorded.
    ///
    /// Everything except Cancelled accepts payments, so balances can still
    /// be settled after check-out or charged on a no-show.
    pub fn ensure_can_add_payment(status: ReservationStatus) -> Result<(), ReservationError> {
        match status {
            ReservationStatus::Cancelled => Err(ReservationError::OperationNotAllowed {
                operation: "add a payment",
                status,
            }),
            _ => Ok(()),
        }
    }

    /// Validates that existing payments may be edited or deleted.
    pub fn ensure_can_modify_payments(status: ReservationStatus) -> Result<(), ReservationError> {
        match status {
            ReservationStatus::Finished | ReservationStatus::Cancelled => {
                Err(ReservationError::OperationNotAllowed {
                    operation: "modify payments",
                    status,
                })
            }
            _ => Ok(()),
        }
    }

    fn transition(
        reservation: &mut Reservation,
        to: ReservationStatus,
        at: DateTime<Utc>,
        room_event: Option<RoomEvent>,
    ) -> Result<StatusTransition, ReservationError> {
        let from = reservation.status;
        Self::ensure_transition(from, to)?;
        reservation.status = to;
        reservation.touch(at);
        Ok(StatusTransition {
            from,
            to,
            at,
            room_event,
        })
    }
}
