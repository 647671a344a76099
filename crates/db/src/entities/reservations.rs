//! `SeaORM` Entity for reservations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ReservationStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_name: String,
    pub client_surname: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub client_document: Option<String>,
    pub room_id: Uuid,
    pub check_in: Date,
    pub check_out: Date,
    pub price_per_night_cents: i64,
    pub total_price_cents: i64,
    pub status: ReservationStatus,
    pub amount_paid_cents: i64,
    pub paid: bool,
    pub check_in_at: Option<DateTimeWithTimeZone>,
    pub check_out_at: Option<DateTimeWithTimeZone>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payment_entries::Entity")]
    PaymentEntries,
    #[sea_orm(has_one = "super::cancellations::Entity")]
    Cancellations,
}

impl Related<super::payment_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentEntries.def()
    }
}

impl Related<super::cancellations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cancellations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
