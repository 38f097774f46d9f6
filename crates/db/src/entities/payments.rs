//! `SeaORM` Entity for payments table.

use super::sea_orm_active_enums::{PartyType, PaymentStatus, PaymentType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub payment_number: String,
    pub payment_type: PaymentType,
    pub payment_date: Date,
    pub party_type: Option<PartyType>,
    pub party_id: Option<Uuid>,
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))")]
    pub exchange_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_amount_base: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_amount_foreign: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub allocated_amount_base: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub unallocated_amount_base: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub tds_amount_base: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub advance_amount_base: Decimal,
    pub is_advance: bool,
    pub status: PaymentStatus,
    pub is_reconciled: bool,
    pub reconciled_at: Option<DateTimeWithTimeZone>,
    pub reconciled_by: Option<Uuid>,
    pub voucher_id: Option<Uuid>,
    pub is_refund: bool,
    pub original_payment_id: Option<Uuid>,
    pub refund_payment_id: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub narration: Option<String>,
    pub is_deleted: bool,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parties::Entity",
        from = "Column::PartyId",
        to = "super::parties::Column::Id"
    )]
    Parties,
    #[sea_orm(has_many = "super::payment_details::Entity")]
    PaymentDetails,
    #[sea_orm(has_many = "super::payment_allocations::Entity")]
    PaymentAllocations,
}

impl Related<super::parties::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parties.def()
    }
}

impl Related<super::payment_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentDetails.def()
    }
}

impl Related<super::payment_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
