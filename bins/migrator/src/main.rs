//! Database migration runner for Innkeep.
//!
//! Usage:
//!   migrator up      - Create the reservation, payment and cancellation schema
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! The target database is read from `DATABASE_URL` (a `.env` file works too)
//! or the `-u` flag.

use innkeep_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // run_cli installs its own subscriber
    cli::run_cli(Migrator).await;
}
