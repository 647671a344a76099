//! Conversions between `SeaORM` models and core domain types.
//!
//! Rows are trusted only as far as the core constructors allow: a stored
//! stay that fails [`StayDates::new`] surfaces as a database error instead
//! of a panic.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{DbErr, Set};

use innkeep_core::cancellation::types::{
    CancellationRecord, RefundDetails, RefundStatus, ReservationSnapshot,
};
use innkeep_core::payment::types::{EditAudit, PaymentEntry, PaymentKind, PaymentMethod};
use innkeep_core::reservation::error::ReservationError;
use innkeep_core::reservation::types::{
    ClientSnapshot, Reservation, ReservationStatus, StayDates,
};
use innkeep_shared::types::{
    CancellationId, Money, PaymentId, ReservationId, RoomId, UserId,
};

use crate::entities::{cancellations, payment_entries, reservations, sea_orm_active_enums as db};

/// Name of the exclusion constraint that forbids overlapping stays.
pub(crate) const NO_OVERLAP_CONSTRAINT: &str = "reservations_no_overlap";

/// Maps any `SeaORM` error into the core taxonomy.
pub(crate) fn db_error(err: DbErr) -> ReservationError {
    ReservationError::Database(err.to_string())
}

/// Returns true if the error is a violation of the no-overlap constraint.
pub(crate) fn is_overlap_violation(err: &DbErr) -> bool {
    err.to_string().contains(NO_OVERLAP_CONSTRAINT)
}

pub(crate) fn to_db_time(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.into()
}

pub(crate) fn from_db_time(at: DateTimeWithTimeZone) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

// ========== Enums ==========

pub(crate) const fn status_to_db(status: ReservationStatus) -> db::ReservationStatus {
    match status {
        ReservationStatus::Pending => db::ReservationStatus::Pending,
        ReservationStatus::Confirmed => db::ReservationStatus::Confirmed,
        ReservationStatus::InProgress => db::ReservationStatus::InProgress,
        ReservationStatus::Finished => db::ReservationStatus::Finished,
        ReservationStatus::Cancelled => db::ReservationStatus::Cancelled,
        ReservationStatus::NoShow => db::ReservationStatus::NoShow,
    }
}

pub(crate) const fn status_from_db(status: db::ReservationStatus) -> ReservationStatus {
    match status {
        db::ReservationStatus::Pending => ReservationStatus::Pending,
        db::ReservationStatus::Confirmed => ReservationStatus::Confirmed,
        db::ReservationStatus::InProgress => ReservationStatus::InProgress,
        db::ReservationStatus::Finished => ReservationStatus::Finished,
        db::ReservationStatus::Cancelled => ReservationStatus::Cancelled,
        db::ReservationStatus::NoShow => ReservationStatus::NoShow,
    }
}

pub(crate) const fn method_to_db(method: PaymentMethod) -> db::PaymentMethod {
    match method {
        PaymentMethod::Cash => db::PaymentMethod::Cash,
        PaymentMethod::Card => db::PaymentMethod::Card,
        PaymentMethod::BankTransfer => db::PaymentMethod::BankTransfer,
        PaymentMethod::Other => db::PaymentMethod::Other,
    }
}

pub(crate) const fn method_from_db(method: db::PaymentMethod) -> PaymentMethod {
    match method {
        db::PaymentMethod::Cash => PaymentMethod::Cash,
        db::PaymentMethod::Card => PaymentMethod::Card,
        db::PaymentMethod::BankTransfer => PaymentMethod::BankTransfer,
        db::PaymentMethod::Other => PaymentMethod::Other,
    }
}

const fn kind_to_db(kind: PaymentKind) -> db::PaymentKind {
    match kind {
        PaymentKind::Payment => db::PaymentKind::Payment,
        PaymentKind::Refund => db::PaymentKind::Refund,
    }
}

const fn kind_from_db(kind: db::PaymentKind) -> PaymentKind {
    match kind {
        db::PaymentKind::Payment => PaymentKind::Payment,
        db::PaymentKind::Refund => PaymentKind::Refund,
    }
}

pub(crate) const fn refund_status_to_db(status: RefundStatus) -> db::RefundStatus {
    match status {
        RefundStatus::NotApplicable => db::RefundStatus::NotApplicable,
        RefundStatus::Pending => db::RefundStatus::Pending,
        RefundStatus::Processed => db::RefundStatus::Processed,
        RefundStatus::Completed => db::RefundStatus::Completed,
        RefundStatus::Rejected => db::RefundStatus::Rejected,
    }
}

pub(crate) const fn refund_status_from_db(status: db::RefundStatus) -> RefundStatus {
    match status {
        db::RefundStatus::NotApplicable => RefundStatus::NotApplicable,
        db::RefundStatus::Pending => RefundStatus::Pending,
        db::RefundStatus::Processed => RefundStatus::Processed,
        db::RefundStatus::Completed => RefundStatus::Completed,
        db::RefundStatus::Rejected => RefundStatus::Rejected,
    }
}

// ========== Payments ==========

pub(crate) fn payment_from_model(model: payment_entries::Model) -> PaymentEntry {
    let edit = match (model.edited_by, model.edited_at, model.edit_reason) {
        (Some(edited_by), Some(edited_at), Some(reason)) => Some(EditAudit {
            edited_by: UserId::from_uuid(edited_by),
            edited_at: from_db_time(edited_at),
            reason,
        }),
        _ => None,
    };

    PaymentEntry {
        id: PaymentId::from_uuid(model.id),
        kind: kind_from_db(model.kind),
        amount: Money::from_cents(model.amount_cents),
        method: method_from_db(model.method),
        note: model.note,
        recorded_at: from_db_time(model.recorded_at),
        recorded_by: UserId::from_uuid(model.recorded_by),
        edit,
    }
}

/// Every column of a payment row except `position` and `created_at`.
pub(crate) fn payment_active_model(
    reservation_id: ReservationId,
    entry: &PaymentEntry,
) -> payment_entries::ActiveModel {
    let audit = entry.edit.as_ref();
    payment_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        reservation_id: Set(reservation_id.into_inner()),
        kind: Set(kind_to_db(entry.kind)),
        amount_cents: Set(entry.amount.cents()),
        method: Set(method_to_db(entry.method)),
        note: Set(entry.note.clone()),
        recorded_at: Set(to_db_time(entry.recorded_at)),
        recorded_by: Set(entry.recorded_by.into_inner()),
        edited_by: Set(audit.map(|a| a.edited_by.into_inner())),
        edited_at: Set(audit.map(|a| to_db_time(a.edited_at))),
        edit_reason: Set(audit.map(|a| a.reason.clone())),
        ..Default::default()
    }
}

// ========== Reservations ==========

pub(crate) fn reservation_from_models(
    model: reservations::Model,
    entries: Vec<payment_entries::Model>,
) -> Result<Reservation, ReservationError> {
    let stay = StayDates::new(model.check_in, model.check_out).map_err(|e| {
        ReservationError::Database(format!("reservation {} has invalid stay: {e}", model.id))
    })?;

    Ok(Reservation {
        id: ReservationId::from_uuid(model.id),
        client: ClientSnapshot {
            name: model.client_name,
            surname: model.client_surname,
            email: model.client_email,
            phone: model.client_phone,
            document: model.client_document,
        },
        room_id: RoomId::from_uuid(model.room_id),
        stay,
        price_per_night: Money::from_cents(model.price_per_night_cents),
        total_price: Money::from_cents(model.total_price_cents),
        status: status_from_db(model.status),
        payments: entries.into_iter().map(payment_from_model).collect(),
        amount_paid: Money::from_cents(model.amount_paid_cents),
        paid: model.paid,
        check_in_at: model.check_in_at.map(from_db_time),
        check_out_at: model.check_out_at.map(from_db_time),
        notes: model.notes,
        created_by: UserId::from_uuid(model.created_by),
        created_at: from_db_time(model.created_at),
        updated_at: from_db_time(model.updated_at),
        version: model.version,
    })
}

/// Every mutable column of a reservation row; `id` and `created_*` are left
/// unset so the model can drive both inserts (after setting them) and
/// version-checked updates.
pub(crate) fn reservation_active_model(reservation: &Reservation) -> reservations::ActiveModel {
    reservations::ActiveModel {
        client_name: Set(reservation.client.name.clone()),
        client_surname: Set(reservation.client.surname.clone()),
        client_email: Set(reservation.client.email.clone()),
        client_phone: Set(reservation.client.phone.clone()),
        client_document: Set(reservation.client.document.clone()),
        room_id: Set(reservation.room_id.into_inner()),
        check_in: Set(reservation.stay.check_in()),
        check_out: Set(reservation.stay.check_out()),
        price_per_night_cents: Set(reservation.price_per_night.cents()),
        total_price_cents: Set(reservation.total_price.cents()),
        status: Set(status_to_db(reservation.status)),
        amount_paid_cents: Set(reservation.amount_paid.cents()),
        paid: Set(reservation.paid),
        check_in_at: Set(reservation.check_in_at.map(to_db_time)),
        check_out_at: Set(reservation.check_out_at.map(to_db_time)),
        notes: Set(reservation.notes.clone()),
        updated_at: Set(to_db_time(reservation.updated_at)),
        version: Set(reservation.version),
        ..Default::default()
    }
}

// ========== Cancellations ==========

pub(crate) fn cancellation_from_model(
    model: cancellations::Model,
) -> Result<CancellationRecord, ReservationError> {
    let snapshot: ReservationSnapshot = serde_json::from_value(model.snapshot).map_err(|e| {
        ReservationError::Database(format!("cancellation {} has invalid snapshot: {e}", model.id))
    })?;

    let refund = match (
        model.refund_amount_cents,
        model.refund_method,
        model.refund_processed_by,
        model.refund_processed_at,
        model.refund_payment_id,
    ) {
        (Some(amount), Some(method), Some(processed_by), Some(processed_at), Some(payment_id)) => {
            Some(RefundDetails {
                amount: Money::from_cents(amount),
                method: method_from_db(method),
                processed_by: UserId::from_uuid(processed_by),
                processed_at: from_db_time(processed_at),
                note: model.refund_note,
                payment_id: PaymentId::from_uuid(payment_id),
            })
        }
        _ => None,
    };

    Ok(CancellationRecord {
        id: CancellationId::from_uuid(model.id),
        reservation_id: ReservationId::from_uuid(model.reservation_id),
        snapshot,
        reason: model.reason,
        cancelled_by: UserId::from_uuid(model.cancelled_by),
        cancelled_at: from_db_time(model.cancelled_at),
        refund_status: refund_status_from_db(model.refund_status),
        refund,
        completed_by: model.completed_by.map(UserId::from_uuid),
        completed_at: model.completed_at.map(from_db_time),
        rejected_by: model.rejected_by.map(UserId::from_uuid),
        rejected_at: model.rejected_at.map(from_db_time),
        rejection_reason: model.rejection_reason,
        version: model.version,
    })
}

/// Refund columns of a cancellation row plus its version.
pub(crate) fn cancellation_refund_model(record: &CancellationRecord) -> cancellations::ActiveModel {
    let refund = record.refund.as_ref();
    cancellations::ActiveModel {
        refund_status: Set(refund_status_to_db(record.refund_status)),
        refund_amount_cents: Set(refund.map(|r| r.amount.cents())),
        refund_method: Set(refund.map(|r| method_to_db(r.method))),
        refund_processed_by: Set(refund.map(|r| r.processed_by.into_inner())),
        refund_processed_at: Set(refund.map(|r| to_db_time(r.processed_at))),
        refund_note: Set(refund.and_then(|r| r.note.clone())),
        refund_payment_id: Set(refund.map(|r| r.payment_id.into_inner())),
        completed_by: Set(record.completed_by.map(UserId::into_inner)),
        completed_at: Set(record.completed_at.map(to_db_time)),
        rejected_by: Set(record.rejected_by.map(UserId::into_inner)),
        rejected_at: Set(record.rejected_at.map(to_db_time)),
        rejection_reason: Set(record.rejection_reason.clone()),
        version: Set(record.version),
        ..Default::default()
    }
}

/// Full insert model of a new cancellation record.
pub(crate) fn cancellation_insert_model(
    record: &CancellationRecord,
    now: DateTime<Utc>,
) -> Result<cancellations::ActiveModel, ReservationError> {
    let snapshot = serde_json::to_value(&record.snapshot)
        .map_err(|e| ReservationError::Database(format!("cannot encode snapshot: {e}")))?;

    let mut model = cancellation_refund_model(record);
    model.id = Set(record.id.into_inner());
    model.reservation_id = Set(record.reservation_id.into_inner());
    model.snapshot = Set(snapshot);
    model.reason = Set(record.reason.clone());
    model.cancelled_by = Set(record.cancelled_by.into_inner());
    model.cancelled_at = Set(to_db_time(record.cancelled_at));
    model.created_at = Set(to_db_time(now));
    model.updated_at = Set(to_db_time(now));
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reservation_row(check_in: NaiveDate, check_out: NaiveDate) -> reservations::Model {
        let now = to_db_time(Utc::now());
        reservations::Model {
            id: uuid::Uuid::now_v7(),
            client_name: "Ana".into(),
            client_surname: "Lopez".into(),
            client_email: None,
            client_phone: None,
            client_document: None,
            room_id: uuid::Uuid::now_v7(),
            check_in,
            check_out,
            price_per_night_cents: 10_000,
            total_price_cents: 50_000,
            status: db::ReservationStatus::Confirmed,
            amount_paid_cents: 0,
            paid: false,
            check_in_at: None,
            check_out_at: None,
            notes: None,
            created_by: uuid::Uuid::now_v7(),
            created_at: now,
            updated_at: now,
            version: 3,
        }
    }

    #[test]
    fn test_enum_mappings_roundtrip() {
        for status in ReservationStatus::ALL {
            assert_eq!(status_from_db(status_to_db(status)), status);
        }
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::Card,
            PaymentMethod::BankTransfer,
            PaymentMethod::Other,
        ] {
            assert_eq!(method_from_db(method_to_db(method)), method);
        }
        for status in [
            RefundStatus::NotApplicable,
            RefundStatus::Pending,
            RefundStatus::Processed,
            RefundStatus::Completed,
            RefundStatus::Rejected,
        ] {
            assert_eq!(refund_status_from_db(refund_status_to_db(status)), status);
        }
    }

    #[test]
    fn test_reservation_row_to_domain() {
        let check_in = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let check_out = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let row = reservation_row(check_in, check_out);
        let id = row.id;

        let reservation = reservation_from_models(row, Vec::new()).unwrap();
        assert_eq!(reservation.id.into_inner(), id);
        assert_eq!(reservation.status, ReservationStatus::Confirmed);
        assert_eq!(reservation.total_price, Money::from_cents(50_000));
        assert_eq!(reservation.nights(), 5);
        assert_eq!(reservation.version, 3);
    }

    #[test]
    fn test_corrupt_stay_is_database_error() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let result = reservation_from_models(reservation_row(day, day), Vec::new());
        assert!(matches!(result, Err(ReservationError::Database(_))));
    }

    #[test]
    fn test_edit_audit_needs_all_columns() {
        let now = to_db_time(Utc::now());
        let row = payment_entries::Model {
            id: uuid::Uuid::now_v7(),
            reservation_id: uuid::Uuid::now_v7(),
            position: 0,
            kind: db::PaymentKind::Payment,
            amount_cents: 1_500,
            method: db::PaymentMethod::Card,
            note: None,
            recorded_at: now,
            recorded_by: uuid::Uuid::now_v7(),
            edited_by: Some(uuid::Uuid::now_v7()),
            edited_at: Some(now),
            edit_reason: Some("wrong amount".into()),
            created_at: now,
        };

        let entry = payment_from_model(row.clone());
        assert_eq!(entry.amount, Money::from_cents(1_500));
        assert_eq!(entry.edit.map(|e| e.reason), Some("wrong amount".to_string()));

        let partial = payment_entries::Model {
            edit_reason: None,
            ..row
        };
        assert!(payment_from_model(partial).edit.is_none());
    }
}
