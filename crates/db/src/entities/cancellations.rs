//! `SeaORM` Entity for cancellations table.
//!
//! The reservation snapshot is stored as JSONB so the record never depends
//! on the live reservation row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PaymentMethod, RefundStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cancellations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub reservation_id: Uuid,
    #[sea_orm(column_type = "JsonBinary")]
    pub snapshot: Json,
    pub reason: String,
    pub cancelled_by: Uuid,
    pub cancelled_at: DateTimeWithTimeZone,
    pub refund_status: RefundStatus,
    pub refund_amount_cents: Option<i64>,
    pub refund_method: Option<PaymentMethod>,
    pub refund_processed_by: Option<Uuid>,
    pub refund_processed_at: Option<DateTimeWithTimeZone>,
    pub refund_note: Option<String>,
    pub refund_payment_id: Option<Uuid>,
    pub completed_by: Option<Uuid>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTimeWithTimeZone>,
    pub rejection_reason: Option<String>,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reservations::Entity",
        from = "Column::ReservationId",
        to = "super::reservations::Column::Id"
    )]
    Reservations,
}

impl Related<super::reservations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
