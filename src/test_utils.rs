//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{Event, Ledger, Person},
    errors::Result,
    tracker::Tracker,
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Midnight UTC on the given day of May 2009.
#[allow(clippy::unwrap_used)]
pub fn test_date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2009, 5, day, 0, 0, 0).unwrap()
}

/// In-memory ledger holding Alice, Bob and Carol (ids 1, 2 and 3).
pub fn three_person_ledger() -> Ledger {
    let mut ledger = Ledger::new();
    for name in ["Alice", "Bob", "Carol"] {
        ledger.add(Person::new(name));
    }
    ledger
}

/// Unsaved event on 2009-05-06: subtotal 95.12 at 5% tip (total 99.88), paid
/// by person 1 and shared evenly by persons 1, 2 and 3.
pub fn sample_event(ledger: &mut Ledger) -> Result<Event> {
    let mut event = Event::new(test_date(6));
    event.description = "Dinner".to_string();
    event.set_tip_percent(5.0, ledger)?;
    event.set_subtotal(9512, ledger)?;
    event.set_payer(Some(1), ledger)?;
    for id in 1..=3 {
        event.set_sharing(id, true, ledger)?;
    }
    Ok(event)
}

/// Adds Alice, Bob and Carol through the tracker and returns their ids.
pub async fn add_three_people(tracker: &mut Tracker) -> Result<Vec<i64>> {
    let mut ids = Vec::new();
    for name in ["Alice", "Bob", "Carol"] {
        ids.push(tracker.add_person(name).await?.id);
    }
    Ok(ids)
}

/// Sets up a tracker on a fresh database with three people.
/// Returns (tracker, person ids) for common test scenarios.
pub async fn setup_tracker() -> Result<(Tracker, Vec<i64>)> {
    let db = setup_test_db().await?;
    let mut tracker = Tracker::open(db).await?;
    let ids = add_three_people(&mut tracker).await?;
    Ok((tracker, ids))
}
