//! Room occupancy read model.
//!
//! Occupancy is derived from reservations on demand, never stored.

use chrono::NaiveDate;
use innkeep_shared::types::{ReservationId, RoomId};
use serde::{Deserialize, Serialize};

use crate::availability::conflict::BookedSlot;
use crate::reservation::types::ReservationStatus;

/// State of a room for one night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RoomState {
    /// Nobody holds the room.
    Free,
    /// Held by an upcoming booking or a no-show.
    Reserved {
        /// The holding reservation.
        reservation_id: ReservationId,
    },
    /// A guest is in-house.
    Occupied {
        /// The in-house reservation.
        reservation_id: ReservationId,
    },
}

/// Occupancy of one room on one night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomOccupancy {
    /// The room.
    pub room_id: RoomId,
    /// The night.
    pub date: NaiveDate,
    /// Derived state.
    pub state: RoomState,
}

impl RoomOccupancy {
    /// Derives the room's state for the night starting on `date`.
    ///
    /// An in-house guest wins over any other booking covering the night.
    /// Finished and cancelled stays no longer count.
    #[must_use]
    pub fn derive(slots: &[BookedSlot], room_id: RoomId, date: NaiveDate) -> Self {
        let covering = slots
            .iter()
            .filter(|s| s.room_id == room_id && s.stay.covers_night(date));

        let mut state = RoomState::Free;
        for slot in covering {
            match slot.status {
                ReservationStatus::InProgress => {
                    state = RoomState::Occupied {
                        reservation_id: slot.reservation_id,
                    };
                    break;
                }
                ReservationStatus::Pending
                | ReservationStatus::Confirmed
                | ReservationStatus::NoShow => {
                    if state == RoomState::Free {
                        state = RoomState::Reserved {
                            reservation_id: slot.reservation_id,
                        };
                    }
                }
                ReservationStatus::Finished | ReservationStatus::Cancelled => {}
            }
        }

        Self {
            room_id,
            date,
            state,
        }
    }

    /// Returns true if nobody holds the room that night.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.state == RoomState::Free
    }
}
