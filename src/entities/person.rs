//! Person entity - one row per participant of the group.
//!
//! The balance is stored in integer cents and is the incremental result of
//! every event; it can always be rebuilt from the events table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Person database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "people")]
pub struct Model {
    /// Unique identifier, allocated by the ledger (never 0)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Running balance in cents; positive means the group owes this person
    pub balance: i64,
    /// Manual ordering key
    pub position: i64,
}

/// Defines relationships between Person and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One person has many participations
    #[sea_orm(has_many = "super::participation::Entity")]
    Participations,
}

impl Related<super::participation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
