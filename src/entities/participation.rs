//! Participation entity - keyed by `(event_id, person_id)`.
//!
//! Rows that do not share and carry a zero total are never written.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Participation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "participations")]
pub struct Model {
    /// Event the stake belongs to
    #[sea_orm(primary_key, auto_increment = false)]
    pub event_id: i64,
    /// Person holding the stake
    #[sea_orm(primary_key, auto_increment = false)]
    pub person_id: i64,
    /// Order in which the person was first referenced on the event
    pub seq: i32,
    /// Whether the person shares the expense
    pub is_sharing: bool,
    /// Whether the share is a fixed amount rather than an even share
    pub share_is_fixed: bool,
    /// Pre-tip amount attributed to the person, in cents
    pub additional_amount: i64,
    /// Computed tip-inclusive share, in cents
    pub total: i64,
}

/// Defines relationships between Participation and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each participation belongs to one event
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id"
    )]
    Event,
    /// Each participation belongs to one person
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::PersonId",
        to = "super::person::Column::Id"
    )]
    Person,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::person::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Person.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
