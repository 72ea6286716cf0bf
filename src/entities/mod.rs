//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod event;
pub mod participation;
pub mod person;

// Re-export specific types to avoid conflicts
pub use event::{Column as EventColumn, Entity as EventEntity, Model as EventModel};
pub use participation::{
    Column as ParticipationColumn, Entity as ParticipationEntity, Model as ParticipationModel,
};
pub use person::{Column as PersonColumn, Entity as PersonEntity, Model as PersonModel};
