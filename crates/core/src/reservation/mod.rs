//! Reservation aggregate.
//!
//! # Modules
//!
//! - `types` - Reservation, stay dates, client snapshot, status
//! - `error` - Error taxonomy shared by the whole booking core
//! - `service` - Creation, updates and pricing

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::{ErrorKind, ReservationError};
pub use service::{BookingPolicy, NewReservation, ReservationService, ReservationUpdate};
pub use types::{ClientSnapshot, Reservation, ReservationStatus, StayDates};
