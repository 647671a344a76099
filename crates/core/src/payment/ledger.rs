//! Payment ledger operations.
//!
//! Every operation validates against the reservation's status and totals
//! first and mutates last, so a failed call leaves the reservation untouched.
//! Successful calls end by re-deriving `amount_paid` and `paid` from the
//! entries.

use chrono::{DateTime, Utc};
use innkeep_shared::types::{Money, PaymentId, UserId};

use crate::payment::types::{
    EditAudit, LedgerChange, NewPayment, PaymentEdit, PaymentEntry, PaymentKind, PaymentMethod,
};
use crate::reservation::error::ReservationError;
use crate::reservation::types::Reservation;
use crate::status::machine::StatusMachine;

/// Stateless service for the payment ledger of a reservation.
pub struct PaymentLedger;

impl PaymentLedger {
    /// Record a payment.
    ///
    /// # Errors
    ///
    /// - `OperationNotAllowed` if the reservation is cancelled
    /// - `Validation` if the amount is not positive
    /// - `LimitExceeded` if the amount is larger than the remaining balance
    pub fn add_payment(
        reservation: &mut Reservation,
        input: NewPayment,
        now: DateTime<Utc>,
    ) -> Result<LedgerChange, ReservationError> {
        StatusMachine::ensure_can_add_payment(reservation.status)?;
        Self::validate_amount(input.amount)?;

        let remaining = reservation.remaining();
        if input.amount > remaining {
            return Err(ReservationError::LimitExceeded {
                attempted: input.amount,
                available: remaining.clamp_non_negative(),
            });
        }

        let entry = PaymentEntry {
            id: PaymentId::new(),
            kind: PaymentKind::Payment,
            amount: input.amount,
            method: input.method,
            note: normalize_note(input.note),
            recorded_at: input.recorded_at.unwrap_or(now),
            recorded_by: input.recorded_by,
            edit: None,
        };

        reservation.payments.push(entry.clone());
        reservation.sync_payment_totals();
        reservation.touch(now);

        Ok(LedgerChange::Added(entry))
    }

    /// Edit a payment in place and stamp the edit audit.
    ///
    /// Lowering an amount is always accepted; raising it must keep the
    /// ledger within the total price.
    ///
    /// # Errors
    ///
    /// - `OperationNotAllowed` if the reservation is finished or cancelled
    /// - `Validation` if the reason is blank or the new amount is not positive
    /// - `PaymentNotFound` if the entry does not exist
    /// - `RefundEntryImmutable` if the entry is a refund
    /// - `LimitExceeded` if the new amount would overshoot the total price
    pub fn edit_payment(
        reservation: &mut Reservation,
        payment_id: PaymentId,
        edit: PaymentEdit,
        now: DateTime<Utc>,
    ) -> Result<LedgerChange, ReservationError> {
        StatusMachine::ensure_can_modify_payments(reservation.status)?;

        let reason = edit.reason.trim();
        if reason.is_empty() {
            return Err(ReservationError::validation("reason", "is required"));
        }

        let index = Self::position(reservation, payment_id)?;
        let before = reservation.payments[index].clone();
        if before.is_refund() {
            return Err(ReservationError::RefundEntryImmutable(payment_id));
        }

        let new_amount = edit.amount.unwrap_or(before.amount);
        Self::validate_amount(new_amount)?;

        // Headroom for this entry: the total minus every other entry.
        let available = reservation.total_price - (reservation.amount_paid - before.amount);
        if new_amount > before.amount && new_amount > available {
            return Err(ReservationError::LimitExceeded {
                attempted: new_amount,
                available: available.clamp_non_negative(),
            });
        }

        let after = PaymentEntry {
            amount: new_amount,
            method: edit.method.unwrap_or(before.method),
            note: match edit.note {
                Some(note) => normalize_note(Some(note)),
                None => before.note.clone(),
            },
            recorded_at: edit.recorded_at.unwrap_or(before.recorded_at),
            edit: Some(EditAudit {
                edited_by: edit.edited_by,
                edited_at: now,
                reason: reason.to_string(),
            }),
            ..before.clone()
        };

        reservation.payments[index] = after.clone();
        reservation.sync_payment_totals();
        reservation.touch(now);

        Ok(LedgerChange::Edited { before, after })
    }

    /// Remove a payment.
    ///
    /// # Errors
    ///
    /// - `OperationNotAllowed` if the reservation is finished or cancelled
    /// - `PaymentNotFound` if the entry does not exist
    /// - `RefundEntryImmutable` if the entry is a refund
    pub fn delete_payment(
        reservation: &mut Reservation,
        payment_id: PaymentId,
        deleted_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<LedgerChange, ReservationError> {
        StatusMachine::ensure_can_modify_payments(reservation.status)?;

        let index = Self::position(reservation, payment_id)?;
        if reservation.payments[index].is_refund() {
            return Err(ReservationError::RefundEntryImmutable(payment_id));
        }

        let entry = reservation.payments.remove(index);
        reservation.sync_payment_totals();
        reservation.touch(now);

        Ok(LedgerChange::Deleted { entry, deleted_by })
    }

    /// Re-derive `amount_paid` and `paid` from the entries.
    ///
    /// Allowed in every status; this is the repair path for aggregates that
    /// drifted from the ledger.
    pub fn recalculate(reservation: &mut Reservation) -> LedgerChange {
        let previous = reservation.amount_paid;
        reservation.sync_payment_totals();
        LedgerChange::Recalculated {
            previous,
            current: reservation.amount_paid,
        }
    }

    /// Post the negative corrective entry of a processed refund.
    ///
    /// Bypasses the status gate: the reservation is already cancelled when
    /// its refund is processed.
    pub(crate) fn post_refund(
        reservation: &mut Reservation,
        amount: Money,
        method: PaymentMethod,
        processed_by: UserId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<PaymentEntry, ReservationError> {
        Self::validate_amount(amount)?;

        let entry = PaymentEntry {
            id: PaymentId::new(),
            kind: PaymentKind::Refund,
            amount: -amount,
            method,
            note: normalize_note(note),
            recorded_at: now,
            recorded_by: processed_by,
            edit: None,
        };

        reservation.payments.push(entry.clone());
        Self::recalculate(reservation);
        reservation.touch(now);

        Ok(entry)
    }

    fn validate_amount(amount: Money) -> Result<(), ReservationError> {
        if amount.is_positive() {
            Ok(())
        } else {
            Err(ReservationError::validation(
                "amount",
                format!("{amount} must be greater than zero"),
            ))
        }
    }

    fn position(
        reservation: &Reservation,
        payment_id: PaymentId,
    ) -> Result<usize, ReservationError> {
        reservation
            .payments
            .iter()
            .position(|p| p.id == payment_id)
            .ok_or(ReservationError::PaymentNotFound {
                reservation_id: reservation.id,
                payment_id,
            })
    }
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
