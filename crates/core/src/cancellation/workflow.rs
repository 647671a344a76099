//! Cancellation and refund workflow.
//!
//! Cancelling snapshots the reservation into a [`CancellationRecord`] and
//! moves the reservation to Cancelled. The record then drives its own refund
//! sub-state-machine; processing a refund is the one path that writes to the
//! ledger of a cancelled reservation.

use chrono::{DateTime, Utc};
use innkeep_shared::types::{CancellationId, UserId};

use crate::cancellation::types::{
    CancellationOutcome, CancellationRecord, RefundDetails, RefundPosting, RefundStatus,
    ReservationSnapshot,
};
use crate::payment::ledger::PaymentLedger;
use crate::payment::types::PaymentMethod;
use crate::reservation::error::ReservationError;
use crate::reservation::types::Reservation;
use crate::status::machine::StatusMachine;

/// Stateless service for cancellations and refunds.
pub struct CancellationWorkflow;

impl CancellationWorkflow {
    /// Cancel a reservation and open its audit record.
    ///
    /// The refund starts Pending when anything was paid, NotApplicable
    /// otherwise.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the reservation is finished, cancelled or a no-show
    /// - `Validation` if the reason is blank
    pub fn cancel(
        reservation: &mut Reservation,
        reason: &str,
        cancelled_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<CancellationOutcome, ReservationError> {
        // 1. Validate
        StatusMachine::ensure_can_cancel(reservation.status)?;
        let reason = required_text("reason", reason)?;

        // 2. Snapshot before the status changes
        let snapshot = ReservationSnapshot::from(&*reservation);
        let refund_status = if snapshot.amount_paid.is_positive() {
            RefundStatus::Pending
        } else {
            RefundStatus::NotApplicable
        };

        // 3. Transition
        let transition = StatusMachine::cancel(reservation, now)?;

        let record = CancellationRecord {
            id: CancellationId::new(),
            reservation_id: reservation.id,
            snapshot,
            reason,
            cancelled_by,
            cancelled_at: now,
            refund_status,
            refund: None,
            completed_by: None,
            completed_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            version: 1,
        };

        Ok(CancellationOutcome { record, transition })
    }

    /// Process a pending refund.
    ///
    /// Refunds the amount paid at cancellation time by posting a negative
    /// entry on the reservation's ledger, then records the details.
    ///
    /// # Errors
    ///
    /// - `InvalidRefundState` unless the refund is Pending
    /// - `Validation` if `reservation` is not the cancelled one
    pub fn process_refund(
        record: &mut CancellationRecord,
        reservation: &mut Reservation,
        method: PaymentMethod,
        processed_by: UserId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<RefundPosting, ReservationError> {
        Self::ensure_refund_status(record, RefundStatus::Pending, "process refund")?;
        if record.reservation_id != reservation.id {
            return Err(ReservationError::validation(
                "reservation_id",
                format!(
                    "cancellation {} belongs to reservation {}, not {}",
                    record.id, record.reservation_id, reservation.id
                ),
            ));
        }

        let amount = record.refundable_amount();
        if !amount.is_positive() {
            return Err(ReservationError::InvalidRefundState {
                operation: "process refund",
                status: record.refund_status,
            });
        }

        let entry =
            PaymentLedger::post_refund(reservation, amount, method, processed_by, note, now)?;

        let details = RefundDetails {
            amount,
            method,
            processed_by,
            processed_at: now,
            note: entry.note.clone(),
            payment_id: entry.id,
        };
        record.refund_status = RefundStatus::Processed;
        record.refund = Some(details.clone());

        Ok(RefundPosting { details, entry })
    }

    /// Confirm that the guest received a processed refund.
    ///
    /// # Errors
    ///
    /// `InvalidRefundState` unless the refund is Processed.
    pub fn complete_refund(
        record: &mut CancellationRecord,
        completed_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ReservationError> {
        Self::ensure_refund_status(record, RefundStatus::Processed, "complete refund")?;

        record.refund_status = RefundStatus::Completed;
        record.completed_by = Some(completed_by);
        record.completed_at = Some(now);
        Ok(())
    }

    /// Decline a pending refund. Terminal.
    ///
    /// # Errors
    ///
    /// - `InvalidRefundState` unless the refund is Pending
    /// - `Validation` if the reason is blank
    pub fn reject_refund(
        record: &mut CancellationRecord,
        rejected_by: UserId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ReservationError> {
        Self::ensure_refund_status(record, RefundStatus::Pending, "reject refund")?;
        let reason = required_text("reason", reason)?;

        record.refund_status = RefundStatus::Rejected;
        record.rejected_by = Some(rejected_by);
        record.rejected_at = Some(now);
        record.rejection_reason = Some(reason);
        Ok(())
    }

    fn ensure_refund_status(
        record: &CancellationRecord,
        expected: RefundStatus,
        operation: &'static str,
    ) -> Result<(), ReservationError> {
        if record.refund_status == expected {
            Ok(())
        } else {
            Err(ReservationError::InvalidRefundState {
                operation,
                status: record.refund_status,
            })
        }
    }
}

fn required_text(field: &'static str, value: &str) -> Result<String, ReservationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ReservationError::validation(field, "is required"))
    } else {
        Ok(trimmed.to_string())
    }
}
