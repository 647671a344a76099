//! Reservation status state machine.
//!
//! # Modules
//!
//! - `types` - Transition results and room events
//! - `machine` - Transition rules and payment permissions

pub mod machine;
pub mod types;

pub use machine::StatusMachine;
pub use types::{RoomEvent, StatusTransition};
