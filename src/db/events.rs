//! Event and participation persistence.
//!
//! An event row and its participation rows are always written together.
//! Participations that are not worth keeping are dropped on write, and the
//! remaining rows keep the order in which people were first referenced, since
//! that order decides where odd cents go when shares are recalculated.

use crate::{
    core::{event::Event, participation::Participation},
    entities::{EventColumn, EventEntity, ParticipationColumn, ParticipationEntity, event, participation},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::OnConflict};
use std::collections::BTreeMap;
use tracing::{debug, trace};

impl From<participation::Model> for Participation {
    fn from(model: participation::Model) -> Self {
        Self::restore(
            model.event_id,
            model.person_id,
            model.is_sharing,
            model.share_is_fixed,
            model.additional_amount,
            model.total,
        )
    }
}

/// Loads every event with its participations, in no particular order.
pub async fn load_events<C>(db: &C) -> Result<Vec<Event>>
where
    C: ConnectionTrait,
{
    let mut participations: BTreeMap<i64, Vec<Participation>> = BTreeMap::new();
    for model in ParticipationEntity::find()
        .order_by_asc(ParticipationColumn::EventId)
        .order_by_asc(ParticipationColumn::Seq)
        .all(db)
        .await?
    {
        participations
            .entry(model.event_id)
            .or_default()
            .push(Participation::from(model));
    }

    let events: Vec<Event> = EventEntity::find()
        .order_by_desc(EventColumn::Date)
        .all(db)
        .await?
        .into_iter()
        .map(|model| {
            let parts = participations.remove(&model.id).unwrap_or_default();
            Event::restore(
                model.id,
                model.description,
                model.subtotal,
                model.tip_percent,
                model.total,
                model.date,
                model.payer_id,
                parts,
            )
        })
        .collect();

    debug!(count = events.len(), "Loaded events");
    Ok(events)
}

/// Writes a saved event and replaces its participation rows.
///
/// # Errors
/// [`Error::EventNotFound`] for an event that was never given an id.
pub async fn persist_event<C>(db: &C, event: &Event) -> Result<()>
where
    C: ConnectionTrait,
{
    if event.is_new() {
        return Err(Error::EventNotFound { id: event.id() });
    }
    trace!(id = event.id(), total = event.total(), "Persisting event");

    let model = event::ActiveModel {
        id: Set(event.id()),
        description: Set(event.description.clone()),
        subtotal: Set(event.subtotal()),
        tip_percent: Set(event.tip_percent()),
        total: Set(event.total()),
        date: Set(event.date),
        payer_id: Set(event.payer_id()),
    };

    EventEntity::insert(model)
        .on_conflict(
            OnConflict::column(EventColumn::Id)
                .update_columns([
                    EventColumn::Description,
                    EventColumn::Subtotal,
                    EventColumn::TipPercent,
                    EventColumn::Total,
                    EventColumn::Date,
                    EventColumn::PayerId,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    ParticipationEntity::delete_many()
        .filter(ParticipationColumn::EventId.eq(event.id()))
        .exec(db)
        .await?;

    let rows: Vec<participation::ActiveModel> = event
        .participations()
        .iter()
        .zip(0..)
        .filter(|(part, _)| part.is_worth_keeping())
        .map(|(part, seq)| participation::ActiveModel {
            event_id: Set(event.id()),
            person_id: Set(part.person_id),
            seq: Set(seq),
            is_sharing: Set(part.is_sharing),
            share_is_fixed: Set(part.share_is_fixed),
            additional_amount: Set(part.additional_amount),
            total: Set(part.total()),
        })
        .collect();

    if !rows.is_empty() {
        ParticipationEntity::insert_many(rows)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

/// Removes an event and its participation rows.
///
/// # Errors
/// [`Error::EventNotFound`] if no row was deleted.
pub async fn delete_event<C>(db: &C, event_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    ParticipationEntity::delete_many()
        .filter(ParticipationColumn::EventId.eq(event_id))
        .exec(db)
        .await?;

    let result = EventEntity::delete_by_id(event_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::EventNotFound { id: event_id });
    }
    debug!(id = event_id, "Deleted event");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{core::ledger::Ledger, db::people::persist_person, test_utils::*};

    async fn saved_people(db: &DatabaseConnection) -> Result<Ledger> {
        let ledger = three_person_ledger();
        for person in ledger.iter() {
            persist_person(db, person).await?;
        }
        Ok(ledger)
    }

    #[tokio::test]
    async fn test_persist_and_load_event() -> Result<()> {
        let db = setup_test_db().await?;
        let mut ledger = saved_people(&db).await?;

        let mut event = sample_event(&mut ledger)?;
        event.assign_id(1);
        persist_event(&db, &event).await?;

        let loaded = load_events(&db).await?;
        assert_eq!(loaded.len(), 1);
        let loaded = &loaded[0];
        assert_eq!(loaded.id(), 1);
        assert_eq!(loaded.total(), 9988);
        assert_eq!(loaded.tip_percent(), 5.0);
        assert_eq!(loaded.payer_id(), Some(1));
        assert_eq!(loaded.participations(), event.participations());
        Ok(())
    }

    #[tokio::test]
    async fn test_worthless_participations_are_dropped() -> Result<()> {
        let db = setup_test_db().await?;
        let mut ledger = saved_people(&db).await?;

        let mut event = sample_event(&mut ledger)?;
        event.set_sharing(2, false, &mut ledger)?;
        event.assign_id(1);
        persist_event(&db, &event).await?;

        let loaded = load_events(&db).await?;
        let person_ids: Vec<i64> = loaded[0]
            .participations()
            .iter()
            .map(|part| part.person_id)
            .collect();
        assert_eq!(person_ids, [1, 3]);
        Ok(())
    }

    #[tokio::test]
    async fn test_unsaved_event_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let mut ledger = saved_people(&db).await?;
        let event = sample_event(&mut ledger)?;

        let result = persist_event(&db, &event).await;
        assert!(matches!(result, Err(Error::EventNotFound { id: 0 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_event() -> Result<()> {
        let db = setup_test_db().await?;
        let mut ledger = saved_people(&db).await?;
        let mut event = sample_event(&mut ledger)?;
        event.assign_id(3);
        persist_event(&db, &event).await?;

        delete_event(&db, 3).await?;
        assert!(load_events(&db).await?.is_empty());
        assert_eq!(ParticipationEntity::find().all(&db).await?.len(), 0);

        let result = delete_event(&db, 3).await;
        assert!(matches!(result, Err(Error::EventNotFound { id: 3 })));
        Ok(())
    }
}
