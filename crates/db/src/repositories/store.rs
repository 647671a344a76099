//! Loading and saving reservation aggregates.
//!
//! A reservation row and its payment rows are read together and written
//! back through a version-checked update: the row is only touched if its
//! `version` still matches the one that was read.

use chrono::{NaiveDate, Utc};
use innkeep_core::availability::conflict::BookedSlot;
use innkeep_core::payment::types::{LedgerChange, PaymentEntry};
use innkeep_core::reservation::error::ReservationError;
use innkeep_core::reservation::types::{Reservation, StayDates};
use innkeep_shared::types::{ReservationId, RoomId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::convert::{
    db_error, is_overlap_violation, payment_active_model, reservation_active_model,
    reservation_from_models, status_from_db, to_db_time,
};
use crate::entities::{payment_entries, reservations, sea_orm_active_enums as db};

/// Loads a reservation with its ledger in insertion order.
///
/// With `for_update`, the row stays locked until the transaction ends.
pub(crate) async fn load_reservation<C: ConnectionTrait>(
    conn: &C,
    id: ReservationId,
    for_update: bool,
) -> Result<Reservation, ReservationError> {
    let mut query = reservations::Entity::find_by_id(id.into_inner());
    if for_update {
        query = query.lock_exclusive();
    }
    let model = query
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or(ReservationError::ReservationNotFound(id))?;

    let entries = payment_entries::Entity::find()
        .filter(payment_entries::Column::ReservationId.eq(model.id))
        .order_by_asc(payment_entries::Column::Position)
        .all(conn)
        .await
        .map_err(db_error)?;

    reservation_from_models(model, entries)
}

/// Fails if the caller read an older version than the stored one.
pub(crate) fn ensure_version(
    reservation: &Reservation,
    expected_version: Option<i64>,
) -> Result<(), ReservationError> {
    match expected_version {
        Some(expected) if expected != reservation.version => {
            Err(ReservationError::ConcurrentModification {
                entity: "reservation",
                id: reservation.id.into_inner(),
                expected_version: expected,
            })
        }
        _ => Ok(()),
    }
}

fn slot_from_model(model: &reservations::Model) -> Result<BookedSlot, ReservationError> {
    let stay = StayDates::new(model.check_in, model.check_out).map_err(|e| {
        ReservationError::Database(format!("reservation {} has invalid stay: {e}", model.id))
    })?;
    Ok(BookedSlot {
        reservation_id: ReservationId::from_uuid(model.id),
        room_id: RoomId::from_uuid(model.room_id),
        stay,
        status: status_from_db(model.status),
    })
}

/// Room-holding bookings of `room_id` that overlap `stay`.
pub(crate) async fn booked_slots<C: ConnectionTrait>(
    conn: &C,
    room_id: RoomId,
    stay: &StayDates,
) -> Result<Vec<BookedSlot>, ReservationError> {
    let models = reservations::Entity::find()
        .filter(reservations::Column::RoomId.eq(room_id.into_inner()))
        .filter(reservations::Column::Status.ne(db::ReservationStatus::Cancelled))
        .filter(reservations::Column::CheckIn.lt(stay.check_out()))
        .filter(reservations::Column::CheckOut.gt(stay.check_in()))
        .order_by_asc(reservations::Column::CheckIn)
        .all(conn)
        .await
        .map_err(db_error)?;

    models.iter().map(slot_from_model).collect()
}

/// Every booking of `room_id` covering the night of `date`, cancelled ones
/// included.
pub(crate) async fn slots_covering<C: ConnectionTrait>(
    conn: &C,
    room_id: RoomId,
    date: NaiveDate,
) -> Result<Vec<BookedSlot>, ReservationError> {
    let models = reservations::Entity::find()
        .filter(reservations::Column::RoomId.eq(room_id.into_inner()))
        .filter(reservations::Column::CheckIn.lte(date))
        .filter(reservations::Column::CheckOut.gt(date))
        .all(conn)
        .await
        .map_err(db_error)?;

    models.iter().map(slot_from_model).collect()
}

fn overlap_conflict(reservation: &Reservation) -> ReservationError {
    ReservationError::Conflict {
        room_id: reservation.room_id,
        check_in: reservation.stay.check_in(),
        check_out: reservation.stay.check_out(),
        conflicting: Vec::new(),
    }
}

/// Inserts a freshly created reservation.
pub(crate) async fn insert_reservation<C: ConnectionTrait>(
    conn: &C,
    reservation: &Reservation,
) -> Result<(), ReservationError> {
    let mut model = reservation_active_model(reservation);
    model.id = Set(reservation.id.into_inner());
    model.created_by = Set(reservation.created_by.into_inner());
    model.created_at = Set(to_db_time(reservation.created_at));

    model.insert(conn).await.map_err(|e| {
        if is_overlap_violation(&e) {
            overlap_conflict(reservation)
        } else {
            db_error(e)
        }
    })?;
    Ok(())
}

/// Writes the reservation row if nobody else changed it since it was read,
/// then bumps `reservation.version`.
pub(crate) async fn save_reservation<C: ConnectionTrait>(
    conn: &C,
    reservation: &mut Reservation,
) -> Result<(), ReservationError> {
    let expected = reservation.version;
    let mut model = reservation_active_model(reservation);
    model.version = Set(expected + 1);

    let result = reservations::Entity::update_many()
        .set(model)
        .filter(reservations::Column::Id.eq(reservation.id.into_inner()))
        .filter(reservations::Column::Version.eq(expected))
        .exec(conn)
        .await
        .map_err(|e| {
            if is_overlap_violation(&e) {
                overlap_conflict(reservation)
            } else {
                db_error(e)
            }
        })?;

    if result.rows_affected == 0 {
        return Err(ReservationError::ConcurrentModification {
            entity: "reservation",
            id: reservation.id.into_inner(),
            expected_version: expected,
        });
    }

    reservation.version = expected + 1;
    Ok(())
}

/// Appends an entry after the last stored position.
pub(crate) async fn insert_payment<C: ConnectionTrait>(
    conn: &C,
    reservation_id: ReservationId,
    entry: &PaymentEntry,
) -> Result<(), ReservationError> {
    let position = payment_entries::Entity::find()
        .filter(payment_entries::Column::ReservationId.eq(reservation_id.into_inner()))
        .order_by_desc(payment_entries::Column::Position)
        .one(conn)
        .await
        .map_err(db_error)?
        .map_or(0, |last| last.position + 1);

    let mut model = payment_active_model(reservation_id, entry);
    model.position = Set(position);
    model.created_at = Set(to_db_time(Utc::now()));
    model.insert(conn).await.map_err(db_error)?;
    Ok(())
}

/// Persists what a ledger operation changed.
pub(crate) async fn apply_ledger_change<C: ConnectionTrait>(
    conn: &C,
    reservation_id: ReservationId,
    change: &LedgerChange,
) -> Result<(), ReservationError> {
    match change {
        LedgerChange::Added(entry) => insert_payment(conn, reservation_id, entry).await,
        LedgerChange::Edited { after, .. } => {
            payment_active_model(reservation_id, after)
                .update(conn)
                .await
                .map_err(db_error)?;
            Ok(())
        }
        LedgerChange::Deleted { entry, .. } => {
            payment_entries::Entity::delete_by_id(entry.id.into_inner())
                .exec(conn)
                .await
                .map_err(db_error)?;
            Ok(())
        }
        LedgerChange::Recalculated { .. } => Ok(()),
    }
}
