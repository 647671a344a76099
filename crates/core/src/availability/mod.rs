//! Room availability.
//!
//! # Modules
//!
//! - `conflict` - Double-booking detection over half-open stays
//! - `occupancy` - Per-night room state derived from reservations

pub mod conflict;
pub mod occupancy;

#[cfg(test)]
mod conflict_props;

pub use conflict::{BookedSlot, ConflictCheck, ConflictChecker};
pub use occupancy::{RoomOccupancy, RoomState};
