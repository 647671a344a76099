//! Cancellation repository: cancelling reservations and driving refunds.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use tracing::{info, warn};

use innkeep_core::cancellation::types::{CancellationRecord, RefundDetails, RefundStatus};
use innkeep_core::cancellation::workflow::CancellationWorkflow;
use innkeep_core::payment::types::{PaymentEntry, PaymentMethod};
use innkeep_core::reservation::error::ReservationError;
use innkeep_core::reservation::types::Reservation;
use innkeep_core::status::types::StatusTransition;
use innkeep_shared::types::{CancellationId, PageRequest, PageResponse, ReservationId, UserId};

use super::store;
use crate::convert::{
    cancellation_from_model, cancellation_insert_model, cancellation_refund_model, db_error,
    refund_status_to_db, to_db_time,
};
use crate::entities::cancellations;

/// Result of cancelling a reservation.
#[derive(Debug, Clone)]
pub struct CancelResult {
    /// The cancelled reservation.
    pub reservation: Reservation,
    /// The audit record opened by the cancellation.
    pub record: CancellationRecord,
    /// The status change, with a room event if the guest was in-house.
    pub transition: StatusTransition,
}

/// Result of processing a refund.
#[derive(Debug, Clone)]
pub struct RefundResult {
    /// The cancellation record, now Processed.
    pub record: CancellationRecord,
    /// The reservation after the refund entry was posted.
    pub reservation: Reservation,
    /// The negative ledger entry.
    pub entry: PaymentEntry,
}

/// Cancellation repository.
#[derive(Debug, Clone)]
pub struct CancellationRepository {
    db: DatabaseConnection,
}

impl CancellationRepository {
    /// Creates a new cancellation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Cancels a reservation and stores its cancellation record.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Reservation is not found
    /// - The reservation is already finished, cancelled or a no-show
    /// - The reason is blank
    /// - Database operation fails
    pub async fn cancel(
        &self,
        reservation_id: ReservationId,
        reason: &str,
        cancelled_by: UserId,
    ) -> Result<CancelResult, ReservationError> {
        let now = Utc::now();
        let txn = self.db.begin().await.map_err(db_error)?;
        let mut reservation = store::load_reservation(&txn, reservation_id, true).await?;

        let outcome = CancellationWorkflow::cancel(&mut reservation, reason, cancelled_by, now)?;
        store::save_reservation(&txn, &mut reservation).await?;
        cancellation_insert_model(&outcome.record, now)?
            .insert(&txn)
            .await
            .map_err(db_error)?;
        txn.commit().await.map_err(db_error)?;

        info!(
            reservation_id = %reservation_id,
            cancellation_id = %outcome.record.id,
            from = %outcome.transition.from,
            refund_status = %outcome.record.refund_status,
            amount_paid = %outcome.record.snapshot.amount_paid,
            room_freed = outcome.transition.room_event.is_some(),
            "Reservation cancelled"
        );

        Ok(CancelResult {
            reservation,
            record: outcome.record,
            transition: outcome.transition,
        })
    }

    /// Refunds what was paid at cancellation time.
    ///
    /// The negative ledger entry, the reservation aggregates and the refund
    /// details are written in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cancellation or reservation is not found
    /// - The refund is not Pending
    /// - Database operation fails
    pub async fn process_refund(
        &self,
        cancellation_id: CancellationId,
        method: PaymentMethod,
        processed_by: UserId,
        note: Option<String>,
    ) -> Result<RefundResult, ReservationError> {
        let now = Utc::now();
        let txn = self.db.begin().await.map_err(db_error)?;
        let mut record = load_record(&txn, cancellation_id, true).await?;
        let mut reservation = store::load_reservation(&txn, record.reservation_id, true).await?;

        let posting = CancellationWorkflow::process_refund(
            &mut record,
            &mut reservation,
            method,
            processed_by,
            note,
            now,
        )?;
        store::insert_payment(&txn, reservation.id, &posting.entry).await?;
        store::save_reservation(&txn, &mut reservation).await?;
        save_record(&txn, &mut record).await?;
        txn.commit().await.map_err(db_error)?;

        let RefundDetails { amount, method, .. } = posting.details;
        info!(
            cancellation_id = %cancellation_id,
            reservation_id = %reservation.id,
            payment_id = %posting.entry.id,
            amount = %amount,
            method = %method,
            "Refund processed"
        );

        Ok(RefundResult {
            record,
            reservation,
            entry: posting.entry,
        })
    }

    /// Confirms that the guest received a processed refund.
    ///
    /// # Errors
    ///
    /// Returns an error if the cancellation is not found, the refund is not
    /// Processed, or the database operation fails.
    pub async fn complete_refund(
        &self,
        cancellation_id: CancellationId,
        completed_by: UserId,
    ) -> Result<CancellationRecord, ReservationError> {
        let record = self
            .update_record(cancellation_id, |record| {
                CancellationWorkflow::complete_refund(record, completed_by, Utc::now())
            })
            .await?;

        info!(
            cancellation_id = %cancellation_id,
            completed_by = %completed_by,
            "Refund completed"
        );
        Ok(record)
    }

    /// Declines a pending refund.
    ///
    /// # Errors
    ///
    /// Returns an error if the cancellation is not found, the refund is not
    /// Pending, the reason is blank, or the database operation fails.
    pub async fn reject_refund(
        &self,
        cancellation_id: CancellationId,
        rejected_by: UserId,
        reason: &str,
    ) -> Result<CancellationRecord, ReservationError> {
        let record = self
            .update_record(cancellation_id, |record| {
                CancellationWorkflow::reject_refund(record, rejected_by, reason, Utc::now())
            })
            .await?;

        warn!(
            cancellation_id = %cancellation_id,
            rejected_by = %rejected_by,
            reason = record.rejection_reason.as_deref().unwrap_or_default(),
            "Refund rejected"
        );
        Ok(record)
    }

    async fn update_record<F>(
        &self,
        cancellation_id: CancellationId,
        apply: F,
    ) -> Result<CancellationRecord, ReservationError>
    where
        F: FnOnce(&mut CancellationRecord) -> Result<(), ReservationError> + Send,
    {
        let txn = self.db.begin().await.map_err(db_error)?;
        let mut record = load_record(&txn, cancellation_id, true).await?;

        apply(&mut record)?;
        save_record(&txn, &mut record).await?;
        txn.commit().await.map_err(db_error)?;
        Ok(record)
    }

    /// Finds a cancellation record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is not found or the query fails.
    pub async fn find(
        &self,
        cancellation_id: CancellationId,
    ) -> Result<CancellationRecord, ReservationError> {
        load_record(&self.db, cancellation_id, false).await
    }

    /// Finds the cancellation record of a reservation, if it was cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<CancellationRecord>, ReservationError> {
        cancellations::Entity::find()
            .filter(cancellations::Column::ReservationId.eq(reservation_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(cancellation_from_model)
            .transpose()
    }

    /// Lists cancellation records, newest first, optionally by refund status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        refund_status: Option<RefundStatus>,
        page: &PageRequest,
    ) -> Result<PageResponse<CancellationRecord>, ReservationError> {
        let query = filtered(refund_status);

        let total = query.clone().count(&self.db).await.map_err(db_error)?;

        let models = query
            .order_by_desc(cancellations::Column::CancelledAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_error)?;

        let records = models
            .into_iter()
            .map(cancellation_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(records, page.page, page.per_page, total))
    }
}

fn filtered(refund_status: Option<RefundStatus>) -> Select<cancellations::Entity> {
    let query = cancellations::Entity::find();
    match refund_status {
        Some(status) => {
            query.filter(cancellations::Column::RefundStatus.eq(refund_status_to_db(status)))
        }
        None => query,
    }
}

async fn load_record<C: ConnectionTrait>(
    conn: &C,
    cancellation_id: CancellationId,
    for_update: bool,
) -> Result<CancellationRecord, ReservationError> {
    let mut query = cancellations::Entity::find_by_id(cancellation_id.into_inner());
    if for_update {
        query = query.lock_exclusive();
    }
    let model = query
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or(ReservationError::CancellationNotFound(cancellation_id))?;

    cancellation_from_model(model)
}

/// Version-checked write of the refund columns.
async fn save_record<C: ConnectionTrait>(
    conn: &C,
    record: &mut CancellationRecord,
) -> Result<(), ReservationError> {
    let expected = record.version;
    let mut model = cancellation_refund_model(record);
    model.version = Set(expected + 1);
    model.updated_at = Set(to_db_time(Utc::now()));

    let result = cancellations::Entity::update_many()
        .set(model)
        .filter(cancellations::Column::Id.eq(record.id.into_inner()))
        .filter(cancellations::Column::Version.eq(expected))
        .exec(conn)
        .await
        .map_err(db_error)?;

    if result.rows_affected == 0 {
        return Err(ReservationError::ConcurrentModification {
            entity: "cancellation",
            id: record.id.into_inner(),
            expected_version: expected,
        });
    }

    record.version = expected + 1;
    Ok(())
}
