//! Reservation repository: booking, updates, status transitions and
//! calendar queries.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::{info, warn};

use innkeep_core::availability::occupancy::RoomOccupancy;
use innkeep_core::reservation::error::ReservationError;
use innkeep_core::reservation::service::{
    BookingPolicy, NewReservation, ReservationService, ReservationUpdate,
};
use innkeep_core::reservation::types::{Reservation, StayDates};
use innkeep_core::status::machine::StatusMachine;
use innkeep_core::status::types::StatusTransition;
use innkeep_shared::types::{ReservationId, RoomId};

use super::store;
use crate::convert::{db_error, reservation_from_models};
use crate::entities::{payment_entries, reservations};
use crate::room_lock::{lock_room, RoomLockExt};

/// A persisted status transition.
#[derive(Debug, Clone)]
pub struct StatusChange {
    /// The reservation after the transition.
    pub reservation: Reservation,
    /// What changed, including any room event.
    pub transition: StatusTransition,
}

/// Reservation repository.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    db: DatabaseConnection,
    policy: BookingPolicy,
}

impl ReservationRepository {
    /// Creates a new reservation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, policy: BookingPolicy) -> Self {
        Self { db, policy }
    }

    /// Books a room.
    ///
    /// The conflict check and the insert run under the room's advisory lock.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Input is invalid
    /// - The room is taken for part of the stay
    /// - Database operation fails
    pub async fn create(&self, input: NewReservation) -> Result<Reservation, ReservationError> {
        let room_id = input.room_id;
        let stay = StayDates::new(input.check_in, input.check_out)?;

        let lock = self.db.lock_room(room_id).await.map_err(db_error)?;
        let slots = store::booked_slots(lock.transaction(), room_id, &stay).await?;

        let reservation = match ReservationService::create(input, &self.policy, &slots, Utc::now())
        {
            Ok(reservation) => reservation,
            Err(err @ ReservationError::Conflict { .. }) => {
                warn!(room_id = %room_id, stay = %stay, "Booking rejected: room already taken");
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        store::insert_reservation(lock.transaction(), &reservation).await?;
        lock.commit().await.map_err(db_error)?;

        info!(
            reservation_id = %reservation.id,
            room_id = %room_id,
            status = %reservation.status,
            total_price = %reservation.total_price,
            "Reservation created"
        );
        Ok(reservation)
    }

    /// Applies a partial update.
    ///
    /// When the update moves the reservation in the calendar, the target
    /// room's lock is taken before the conflict check.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Reservation is not found or `expected_version` is stale
    /// - The update is not allowed in the current status
    /// - Input is invalid or the new slot is taken
    /// - Database operation fails
    pub async fn update(
        &self,
        id: ReservationId,
        update: ReservationUpdate,
        expected_version: Option<i64>,
    ) -> Result<Reservation, ReservationError> {
        let txn = self.db.begin().await.map_err(db_error)?;
        let mut reservation = store::load_reservation(&txn, id, true).await?;
        store::ensure_version(&reservation, expected_version)?;

        let room_id = update.target_room(reservation.room_id);
        let slots = if update.touches_availability() {
            lock_room(&txn, room_id).await.map_err(db_error)?;
            let stay = StayDates::new(
                update.check_in.unwrap_or(reservation.stay.check_in()),
                update.check_out.unwrap_or(reservation.stay.check_out()),
            )?;
            store::booked_slots(&txn, room_id, &stay).await?
        } else {
            Vec::new()
        };

        ReservationService::apply_update(
            &mut reservation,
            update,
            &self.policy,
            &slots,
            Utc::now(),
        )?;
        store::save_reservation(&txn, &mut reservation).await?;
        txn.commit().await.map_err(db_error)?;

        info!(
            reservation_id = %id,
            room_id = %reservation.room_id,
            stay = %reservation.stay,
            total_price = %reservation.total_price,
            version = reservation.version,
            "Reservation updated"
        );
        Ok(reservation)
    }

    /// Confirms a pending reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the reservation is not found, not pending, or the
    /// database operation fails.
    pub async fn confirm(&self, id: ReservationId) -> Result<StatusChange, ReservationError> {
        self.transition(id, |reservation| {
            StatusMachine::confirm(reservation, Utc::now())
        })
        .await
    }

    /// Checks the guest in.
    ///
    /// # Errors
    ///
    /// Returns an error if the reservation is not found, not upcoming, or the
    /// database operation fails.
    pub async fn check_in(
        &self,
        id: ReservationId,
        at: Option<DateTime<Utc>>,
    ) -> Result<StatusChange, ReservationError> {
        self.transition(id, |reservation| StatusMachine::check_in(reservation, at))
            .await
    }

    /// Checks the guest out.
    ///
    /// # Errors
    ///
    /// Returns an error if the reservation is not found, not in progress, or
    /// the database operation fails.
    pub async fn check_out(
        &self,
        id: ReservationId,
        at: Option<DateTime<Utc>>,
    ) -> Result<StatusChange, ReservationError> {
        self.transition(id, |reservation| StatusMachine::check_out(reservation, at))
            .await
    }

    /// Marks a guest who never arrived.
    ///
    /// # Errors
    ///
    /// Returns an error if the reservation is not found, not upcoming, or the
    /// database operation fails.
    pub async fn mark_no_show(&self, id: ReservationId) -> Result<StatusChange, ReservationError> {
        self.transition(id, |reservation| {
            StatusMachine::mark_no_show(reservation, Utc::now())
        })
        .await
    }

    async fn transition<F>(
        &self,
        id: ReservationId,
        apply: F,
    ) -> Result<StatusChange, ReservationError>
    where
        F: FnOnce(&mut Reservation) -> Result<StatusTransition, ReservationError> + Send,
    {
        let txn = self.db.begin().await.map_err(db_error)?;
        let mut reservation = store::load_reservation(&txn, id, true).await?;

        let transition = apply(&mut reservation)?;
        store::save_reservation(&txn, &mut reservation).await?;
        txn.commit().await.map_err(db_error)?;

        info!(
            reservation_id = %id,
            room_id = %reservation.room_id,
            from = %transition.from,
            to = %transition.to,
            room_event = transition.room_event.as_ref().map(|e| e.name()),
            "Reservation status changed"
        );
        Ok(StatusChange {
            reservation,
            transition,
        })
    }

    /// Finds a reservation with its ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the reservation is not found or the query fails.
    pub async fn find(&self, id: ReservationId) -> Result<Reservation, ReservationError> {
        store::load_reservation(&self.db, id, false).await
    }

    /// Lists the reservations of a room whose stay overlaps `[from, to)`,
    /// cancelled ones included, ordered by check-in.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is empty or the query fails.
    pub async fn list_for_room(
        &self,
        room_id: RoomId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Reservation>, ReservationError> {
        let window = StayDates::new(from, to)?;

        let rows = reservations::Entity::find()
            .filter(reservations::Column::RoomId.eq(room_id.into_inner()))
            .filter(reservations::Column::CheckIn.lt(window.check_out()))
            .filter(reservations::Column::CheckOut.gt(window.check_in()))
            .order_by_asc(reservations::Column::CheckIn)
            .find_with_related(payment_entries::Entity)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        rows.into_iter()
            .map(|(model, mut entries)| {
                entries.sort_by_key(|e| e.position);
                reservation_from_models(model, entries)
            })
            .collect()
    }

    /// Answers which reservation holds a room on the night of `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn occupancy(
        &self,
        room_id: RoomId,
        date: NaiveDate,
    ) -> Result<RoomOccupancy, ReservationError> {
        let slots = store::slots_covering(&self.db, room_id, date).await?;
        Ok(RoomOccupancy::derive(&slots, room_id, date))
    }
}
