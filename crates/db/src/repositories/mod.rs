//! Repository abstractions for data access.
//!
//! Repositories load reservation aggregates, hand them to the core services
//! and write back what changed, hiding the `SeaORM` details from callers.

pub mod cancellation;
pub mod payment;
pub mod reservation;

mod store;

pub use cancellation::{CancelResult, CancellationRepository, RefundResult};
pub use payment::{LedgerOutcome, PaymentRepository};
pub use reservation::{ReservationRepository, StatusChange};
