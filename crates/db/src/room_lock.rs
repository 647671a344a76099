//! Per-room advisory locks.
//!
//! Conflict checks and the writes they guard must not interleave across
//! requests for the same room. Every writer that can move a reservation in
//! the calendar first takes a transaction-scoped PostgreSQL advisory lock
//! keyed by the room id; the lock is released on commit or rollback.
//!
//! # Usage
//!
//! ```ignore
//! use innkeep_db::room_lock::RoomLockExt;
//!
//! let lock = db.lock_room(room_id).await?;
//! let booked = reservations::Entity::find().all(lock.transaction()).await?;
//! // ... check and insert ...
//! lock.commit().await?;
//! ```

use innkeep_shared::types::RoomId;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, Statement,
    TransactionTrait,
};

/// Key derivation happens in SQL so every client hashes the same way.
const ADVISORY_LOCK_SQL: &str = "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))";

fn lock_statement(room_id: RoomId) -> Statement {
    Statement::from_sql_and_values(
        DbBackend::Postgres,
        ADVISORY_LOCK_SQL,
        [format!("room:{room_id}").into()],
    )
}

/// A transaction holding the advisory lock of one room.
pub struct RoomLock {
    txn: DatabaseTransaction,
    room_id: RoomId,
}

impl RoomLock {
    /// Begins a transaction and blocks until the room's lock is granted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the lock
    /// cannot be taken.
    pub async fn begin(db: &DatabaseConnection, room_id: RoomId) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        lock_room(&txn, room_id).await?;
        Ok(Self { txn, room_id })
    }

    /// The locked room.
    #[must_use]
    pub const fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Returns the underlying transaction for executing queries.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction and releases the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }
}

/// Extension trait for `DatabaseConnection` to open room-locked transactions.
#[async_trait::async_trait]
pub trait RoomLockExt {
    /// Begins a transaction holding the lock of `room_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be taken.
    async fn lock_room(&self, room_id: RoomId) -> Result<RoomLock, DbErr>;
}

#[async_trait::async_trait]
impl RoomLockExt for DatabaseConnection {
    async fn lock_room(&self, room_id: RoomId) -> Result<RoomLock, DbErr> {
        RoomLock::begin(self, room_id).await
    }
}

/// Takes the room's lock inside an existing transaction.
///
/// Use this when the room is only known after reading inside the
/// transaction, e.g. when an update moves a reservation.
///
/// # Errors
///
/// Returns an error if the lock cannot be taken.
pub async fn lock_room(txn: &DatabaseTransaction, room_id: RoomId) -> Result<(), DbErr> {
    txn.execute(lock_statement(room_id)).await?;
    Ok(())
}
