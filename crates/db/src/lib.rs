//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repositories for reservations, payments and cancellations
//! - Per-room advisory locks
//! - Database migrations

mod convert;

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod room_lock;

pub use repositories::{
    CancelResult, CancellationRepository, LedgerOutcome, PaymentRepository, RefundResult,
    ReservationRepository, StatusChange,
};
pub use room_lock::{RoomLock, RoomLockExt};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use innkeep_shared::config::DatabaseConfig;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection using the application configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
