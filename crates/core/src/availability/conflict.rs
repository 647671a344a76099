//! Room/date conflict detection.
//!
//! A room is double-booked when two reservations that still hold it overlap
//! on the half-open interval `[check_in, check_out)`. Cancelled reservations
//! release their slot; no-shows do not.

use innkeep_shared::types::{ReservationId, RoomId};
use serde::{Deserialize, Serialize};

use crate::reservation::error::ReservationError;
use crate::reservation::types::{Reservation, ReservationStatus, StayDates};

/// The part of a reservation that matters for availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedSlot {
    /// The reservation holding the slot.
    pub reservation_id: ReservationId,
    /// The room.
    pub room_id: RoomId,
    /// The stay.
    pub stay: StayDates,
    /// Reservation status.
    pub status: ReservationStatus,
}

impl From<&Reservation> for BookedSlot {
    fn from(reservation: &Reservation) -> Self {
        Self {
            reservation_id: reservation.id,
            room_id: reservation.room_id,
            stay: reservation.stay,
            status: reservation.status,
        }
    }
}

/// Result of a conflict check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictCheck {
    /// Requested room.
    pub room_id: RoomId,
    /// Requested stay.
    pub requested: StayDates,
    /// Slots overlapping the request, in input order.
    pub conflicts: Vec<BookedSlot>,
}

impl ConflictCheck {
    /// Returns true if any slot overlaps the request.
    #[must_use]
    pub fn has_conflict(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Ids of the overlapping reservations.
    #[must_use]
    pub fn conflicting_ids(&self) -> Vec<ReservationId> {
        self.conflicts.iter().map(|s| s.reservation_id).collect()
    }

    /// Converts the check into a result.
    pub fn into_result(self) -> Result<(), ReservationError> {
        if self.has_conflict() {
            Err(ReservationError::Conflict {
                room_id: self.room_id,
                check_in: self.requested.check_in(),
                check_out: self.requested.check_out(),
                conflicting: self.conflicting_ids(),
            })
        } else {
            Ok(())
        }
    }
}

/// Stateless conflict checker.
pub struct ConflictChecker;

impl ConflictChecker {
    /// Lists every slot that blocks `stay` in `room_id`.
    ///
    /// `slots` may contain other rooms and cancelled reservations; both are
    /// ignored. `exclude` skips the reservation being edited.
    #[must_use]
    pub fn check(
        slots: &[BookedSlot],
        room_id: RoomId,
        stay: &StayDates,
        exclude: Option<ReservationId>,
    ) -> ConflictCheck {
        let conflicts = slots
            .iter()
            .filter(|slot| slot.room_id == room_id)
            .filter(|slot| slot.status.holds_room())
            .filter(|slot| Some(slot.reservation_id) != exclude)
            .filter(|slot| slot.stay.overlaps(stay))
            .copied()
            .collect();

        ConflictCheck {
            room_id,
            requested: *stay,
            conflicts,
        }
    }

    /// Returns true if the room is already taken for part of `stay`.
    #[must_use]
    pub fn has_conflict(
        slots: &[BookedSlot],
        room_id: RoomId,
        stay: &StayDates,
        exclude: Option<ReservationId>,
    ) -> bool {
        Self::check(slots, room_id, stay, exclude).has_conflict()
    }

    /// Fails with [`ReservationError::Conflict`] if the room is taken.
    pub fn ensure_available(
        slots: &[BookedSlot],
        room_id: RoomId,
        stay: &StayDates,
        exclude: Option<ReservationId>,
    ) -> Result<(), ReservationError> {
        Self::check(slots, room_id, stay, exclude).into_result()
    }
}
