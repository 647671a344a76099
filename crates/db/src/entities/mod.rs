//! `SeaORM` entity definitions.

pub mod cancellations;
pub mod payment_entries;
pub mod reservations;
pub mod sea_orm_active_enums;
