//! Core business logic for Innkeep.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and state machines live here; the
//! persistence layer loads aggregates, calls these services and stores the
//! result.
//!
//! # Modules
//!
//! - `reservation` - Reservation aggregate, creation and updates
//! - `availability` - Room/date conflict detection and occupancy
//! - `payment` - Payment ledger with aggregate invariants
//! - `status` - Reservation status state machine and room events
//! - `cancellation` - Cancellation records and the refund workflow

pub mod availability;
pub mod cancellation;
pub mod payment;
pub mod reservation;
pub mod status;

#[cfg(test)]
mod test_support;

pub use availability::{BookedSlot, ConflictCheck, ConflictChecker, RoomOccupancy, RoomState};
pub use cancellation::{CancellationRecord, CancellationWorkflow, RefundStatus};
pub use payment::{LedgerChange, PaymentEntry, PaymentLedger, PaymentMethod};
pub use reservation::{
    BookingPolicy, Reservation, ReservationError, ReservationService, ReservationStatus,
    StayDates,
};
pub use status::{RoomEvent, StatusMachine, StatusTransition};
