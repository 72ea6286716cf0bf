//! Persistence layer over `SeaORM`.
//!
//! The engine performs no I/O of its own; these functions are the store it is
//! saved to. All of them accept an open `DatabaseTransaction` so an event, its
//! participations and the affected people commit together.

/// Event and participation rows
pub mod events;
/// Person rows
pub mod people;

pub use events::{delete_event, load_events, persist_event};
pub use people::{load_people, persist_person};
