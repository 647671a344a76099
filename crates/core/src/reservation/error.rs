//! Reservation error types.
//!
//! One taxonomy covers the whole booking core: validation, room conflicts,
//! missing entities, illegal state, payment ceilings and stale writes. Every
//! variant carries the ids or fields a caller needs to render a specific
//! message.

use chrono::NaiveDate;
use innkeep_shared::types::{CancellationId, Money, PaymentId, ReservationId, RoomId};
use innkeep_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::cancellation::types::RefundStatus;
use crate::reservation::types::ReservationStatus;

/// Coarse classification of a [`ReservationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input.
    Validation,
    /// Room/date overlap.
    Conflict,
    /// Unknown reservation, payment or cancellation.
    NotFound,
    /// Operation illegal in the current status.
    State,
    /// Payment would exceed the total price.
    LimitExceeded,
    /// Stale version on write.
    Concurrency,
    /// Storage failure.
    Internal,
}

/// Errors that can occur during reservation operations.
#[derive(Debug, Error)]
pub enum ReservationError {
    // ========== Validation Errors ==========
    /// Input failed validation.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    // ========== Conflict Errors ==========
    /// The room is already booked for part of the requested stay.
    #[error("Room {room_id} is already booked between {check_in} and {check_out}")]
    Conflict {
        /// The requested room.
        room_id: RoomId,
        /// Requested check-in date.
        check_in: NaiveDate,
        /// Requested check-out date.
        check_out: NaiveDate,
        /// Reservations occupying the range.
        conflicting: Vec<ReservationId>,
    },

    // ========== Not Found Errors ==========
    /// Reservation not found.
    #[error("Reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    /// Payment entry not found on the reservation.
    #[error("Payment {payment_id} not found on reservation {reservation_id}")]
    PaymentNotFound {
        /// The owning reservation.
        reservation_id: ReservationId,
        /// The missing entry.
        payment_id: PaymentId,
    },

    /// Cancellation record not found.
    #[error("Cancellation not found: {0}")]
    CancellationNotFound(CancellationId),

    // ========== State Errors ==========
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: ReservationStatus,
        /// The attempted target status.
        to: ReservationStatus,
    },

    /// Operation is not permitted while the reservation has this status.
    #[error("Cannot {operation} while reservation is {status}")]
    OperationNotAllowed {
        /// The attempted operation.
        operation: &'static str,
        /// The current status.
        status: ReservationStatus,
    },

    /// Refund operation is not permitted in the current refund status.
    #[error("Cannot {operation} while refund is {status}")]
    InvalidRefundState {
        /// The attempted operation.
        operation: &'static str,
        /// The current refund status.
        status: RefundStatus,
    },

    /// Refund entries are only written by the cancellation workflow.
    #[error("Payment {0} is a refund entry and cannot be changed")]
    RefundEntryImmutable(PaymentId),

    // ========== Limit Errors ==========
    /// Payment would push the amount paid above the total price.
    #[error("Amount {attempted} exceeds the available {available}")]
    LimitExceeded {
        /// The amount that was attempted.
        attempted: Money,
        /// The most that could have been accepted.
        available: Money,
    },

    // ========== Concurrency Errors ==========
    /// The record changed since it was read.
    #[error("Concurrent modification of {entity} {id} (expected version {expected_version}), please retry")]
    ConcurrentModification {
        /// Entity name.
        entity: &'static str,
        /// Entity id.
        id: Uuid,
        /// The version the writer read.
        expected_version: i64,
    },

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ReservationError {
    /// Shorthand for a validation error.
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::ReservationNotFound(_)
            | Self::PaymentNotFound { .. }
            | Self::CancellationNotFound(_) => ErrorKind::NotFound,
            Self::InvalidTransition { .. }
            | Self::OperationNotAllowed { .. }
            | Self::InvalidRefundState { .. }
            | Self::RefundEntryImmutable(_) => ErrorKind::State,
            Self::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            Self::ConcurrentModification { .. } => ErrorKind::Concurrency,
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Conflict { .. } => "ROOM_CONFLICT",
            Self::ReservationNotFound(_) => "RESERVATION_NOT_FOUND",
            Self::PaymentNotFound { .. } => "PAYMENT_NOT_FOUND",
            Self::CancellationNotFound(_) => "CANCELLATION_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::OperationNotAllowed { .. } => "OPERATION_NOT_ALLOWED",
            Self::InvalidRefundState { .. } => "INVALID_REFUND_STATE",
            Self::RefundEntryImmutable(_) => "REFUND_ENTRY_IMMUTABLE",
            Self::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict | ErrorKind::Concurrency => 409,
            ErrorKind::State | ErrorKind::LimitExceeded => 422,
            ErrorKind::Internal => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::State => Self::InvalidState(message),
            ErrorKind::LimitExceeded => Self::LimitExceeded(message),
            ErrorKind::Concurrency => Self::ConcurrentModification(message),
            ErrorKind::Internal => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_status() {
        let err = ReservationError::validation("check_out", "must be after check-in");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.to_string(), "Invalid check_out: must be after check-in");

        let err = ReservationError::ReservationNotFound(ReservationId::from_uuid(Uuid::nil()));
        assert_eq!(err.error_code(), "RESERVATION_NOT_FOUND");
        assert_eq!(err.http_status_code(), 404);

        let err = ReservationError::InvalidTransition {
            from: ReservationStatus::Finished,
            to: ReservationStatus::InProgress,
        };
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(err.http_status_code(), 422);
        assert_eq!(
            err.to_string(),
            "Invalid status transition from finished to in_progress"
        );
    }

    #[test]
    fn test_conflict_carries_ids() {
        let blocking = ReservationId::new();
        let err = ReservationError::Conflict {
            room_id: RoomId::new(),
            check_in: NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
            conflicting: vec![blocking],
        };
        assert_eq!(err.error_code(), "ROOM_CONFLICT");
        assert_eq!(err.http_status_code(), 409);
        assert!(err.to_string().contains("2024-01-12"));
        match err {
            ReservationError::Conflict { conflicting, .. } => assert_eq!(conflicting, vec![blocking]),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_limit_exceeded_display() {
        let err = ReservationError::LimitExceeded {
            attempted: Money::from_cents(30_000),
            available: Money::from_cents(20_000),
        };
        assert_eq!(err.to_string(), "Amount 300.00 exceeds the available 200.00");
        assert_eq!(err.kind(), ErrorKind::LimitExceeded);
    }

    #[test]
    fn test_retryable_errors() {
        let err = ReservationError::ConcurrentModification {
            entity: "reservation",
            id: Uuid::nil(),
            expected_version: 3,
        };
        assert!(err.is_retryable());
        assert!(!ReservationError::Database("boom".into()).is_retryable());
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = ReservationError::InvalidRefundState {
            operation: "process refund",
            status: RefundStatus::Processed,
        }
        .into();
        assert_eq!(app.error_code(), "INVALID_STATE");
        assert_eq!(app.to_string(), "Invalid state: Cannot process refund while refund is processed");

        let app: AppError = ReservationError::LimitExceeded {
            attempted: Money::from_cents(1),
            available: Money::ZERO,
        }
        .into();
        assert_eq!(app.status_code(), 422);
    }
}
