//! Status transition results and room events.

use chrono::{DateTime, Utc};
use innkeep_shared::types::{ReservationId, RoomId};
use serde::{Deserialize, Serialize};

use crate::reservation::types::ReservationStatus;

/// Room occupancy change caused by a status transition.
///
/// Room state is never written by the booking core; consumers that keep a
/// room-state read model subscribe to these events instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    /// The guest moved in.
    Occupied {
        /// The room.
        room_id: RoomId,
        /// The reservation now occupying it.
        reservation_id: ReservationId,
        /// When it happened.
        at: DateTime<Utc>,
    },
    /// The room was released.
    Freed {
        /// The room.
        room_id: RoomId,
        /// The reservation that released it.
        reservation_id: ReservationId,
        /// When it happened.
        at: DateTime<Utc>,
    },
}

impl RoomEvent {
    /// The affected room.
    #[must_use]
    pub const fn room_id(&self) -> RoomId {
        match self {
            Self::Occupied { room_id, .. } | Self::Freed { room_id, .. } => *room_id,
        }
    }

    /// Returns the event name used in logs and outboxes.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Occupied { .. } => "room_occupied",
            Self::Freed { .. } => "room_freed",
        }
    }
}

/// A completed status transition with its side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    /// Status before.
    pub from: ReservationStatus,
    /// Status after.
    pub to: ReservationStatus,
    /// When the transition happened.
    pub at: DateTime<Utc>,
    /// Room occupancy change, if any.
    pub room_event: Option<RoomEvent>,
}
