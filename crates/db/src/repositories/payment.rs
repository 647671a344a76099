//! Payment ledger repository.
//!
//! Every operation locks the reservation row, runs the ledger rule on the
//! loaded aggregate and writes the entry change and the new aggregates in the
//! same transaction.

use chrono::Utc;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::info;

use innkeep_core::payment::ledger::PaymentLedger;
use innkeep_core::payment::types::{LedgerChange, NewPayment, PaymentEdit};
use innkeep_core::reservation::error::ReservationError;
use innkeep_core::reservation::types::Reservation;
use innkeep_shared::types::{PaymentId, ReservationId, UserId};

use super::store;
use crate::convert::db_error;

/// A persisted ledger operation.
#[derive(Debug, Clone)]
pub struct LedgerOutcome {
    /// The reservation with its updated ledger.
    pub reservation: Reservation,
    /// What the operation changed.
    pub change: LedgerChange,
}

/// Payment ledger repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a payment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Reservation is not found or `expected_version` is stale
    /// - The reservation is cancelled
    /// - The amount is not positive or exceeds the remaining balance
    /// - Database operation fails
    pub async fn add_payment(
        &self,
        reservation_id: ReservationId,
        input: NewPayment,
        expected_version: Option<i64>,
    ) -> Result<LedgerOutcome, ReservationError> {
        let outcome = self
            .apply(reservation_id, expected_version, |reservation| {
                PaymentLedger::add_payment(reservation, input, Utc::now())
            })
            .await?;

        if let LedgerChange::Added(entry) = &outcome.change {
            info!(
                reservation_id = %reservation_id,
                payment_id = %entry.id,
                amount = %entry.amount,
                method = %entry.method,
                amount_paid = %outcome.reservation.amount_paid,
                "Payment recorded"
            );
        }
        Ok(outcome)
    }

    /// Edits a payment and stamps its audit fields.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Reservation or payment is not found, or `expected_version` is stale
    /// - The reservation is finished or cancelled
    /// - The entry is a refund
    /// - The reason is blank or the new amount is out of bounds
    /// - Database operation fails
    pub async fn edit_payment(
        &self,
        reservation_id: ReservationId,
        payment_id: PaymentId,
        edit: PaymentEdit,
        expected_version: Option<i64>,
    ) -> Result<LedgerOutcome, ReservationError> {
        let outcome = self
            .apply(reservation_id, expected_version, |reservation| {
                PaymentLedger::edit_payment(reservation, payment_id, edit, Utc::now())
            })
            .await?;

        if let LedgerChange::Edited { before, after } = &outcome.change {
            info!(
                reservation_id = %reservation_id,
                payment_id = %payment_id,
                before = %before.amount,
                after = %after.amount,
                edited_by = ?after.edit.as_ref().map(|e| e.edited_by),
                "Payment edited"
            );
        }
        Ok(outcome)
    }

    /// Removes a payment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Reservation or payment is not found, or `expected_version` is stale
    /// - The reservation is finished or cancelled
    /// - The entry is a refund
    /// - Database operation fails
    pub async fn delete_payment(
        &self,
        reservation_id: ReservationId,
        payment_id: PaymentId,
        deleted_by: UserId,
        expected_version: Option<i64>,
    ) -> Result<LedgerOutcome, ReservationError> {
        let outcome = self
            .apply(reservation_id, expected_version, |reservation| {
                PaymentLedger::delete_payment(reservation, payment_id, deleted_by, Utc::now())
            })
            .await?;

        if let LedgerChange::Deleted { entry, deleted_by } = &outcome.change {
            info!(
                reservation_id = %reservation_id,
                payment_id = %payment_id,
                amount = %entry.amount,
                deleted_by = %deleted_by,
                "Payment deleted"
            );
        }
        Ok(outcome)
    }

    /// Re-derives `amount_paid` and `paid` from the stored entries.
    ///
    /// The row is only written when the stored aggregates had drifted.
    ///
    /// # Errors
    ///
    /// Returns an error if the reservation is not found or the database
    /// operation fails.
    pub async fn recalculate(
        &self,
        reservation_id: ReservationId,
    ) -> Result<LedgerOutcome, ReservationError> {
        let txn = self.db.begin().await.map_err(db_error)?;
        let mut reservation = store::load_reservation(&txn, reservation_id, true).await?;
        let paid_before = reservation.paid;

        let change = PaymentLedger::recalculate(&mut reservation);
        let drifted = match &change {
            LedgerChange::Recalculated { previous, current } => {
                previous != current || paid_before != reservation.paid
            }
            _ => false,
        };

        if drifted {
            store::save_reservation(&txn, &mut reservation).await?;
        }
        txn.commit().await.map_err(db_error)?;

        if drifted {
            info!(
                reservation_id = %reservation_id,
                amount_paid = %reservation.amount_paid,
                paid = reservation.paid,
                "Payment totals repaired"
            );
        }
        Ok(LedgerOutcome {
            reservation,
            change,
        })
    }

    async fn apply<F>(
        &self,
        reservation_id: ReservationId,
        expected_version: Option<i64>,
        operation: F,
    ) -> Result<LedgerOutcome, ReservationError>
    where
        F: FnOnce(&mut Reservation) -> Result<LedgerChange, ReservationError> + Send,
    {
        let txn = self.db.begin().await.map_err(db_error)?;
        let mut reservation = store::load_reservation(&txn, reservation_id, true).await?;
        store::ensure_version(&reservation, expected_version)?;

        let change = operation(&mut reservation)?;
        store::apply_ledger_change(&txn, reservation_id, &change).await?;
        store::save_reservation(&txn, &mut reservation).await?;
        txn.commit().await.map_err(db_error)?;

        Ok(LedgerOutcome {
            reservation,
            change,
        })
    }
}
