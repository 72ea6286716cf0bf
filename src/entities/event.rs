//! Event entity - a shared bill.
//!
//! Amounts are integer cents; `tip_percent` is the only fractional column.
//! `payer_id` is NULL when nobody has been marked as paying.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Event database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    /// Unique identifier, allocated when the event is first saved
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Free-form description
    pub description: String,
    /// Cost before tip, in cents
    pub subtotal: i64,
    /// Tip rate as a percentage of the subtotal
    pub tip_percent: f64,
    /// Total with tip, in cents
    pub total: i64,
    /// When the event happened
    pub date: DateTimeUtc,
    /// Person who fronted the total
    pub payer_id: Option<i64>,
}

/// Defines relationships between Event and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One event has many participations
    #[sea_orm(has_many = "super::participation::Entity")]
    Participations,
}

impl Related<super::participation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
