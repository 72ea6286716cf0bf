//! Saved events, newest first.

use crate::{
    core::event::Event,
    errors::{Error, Result},
};
use std::cmp::Ordering;

/// Events ordered by descending date, ties broken by descending id.
#[derive(Clone, Debug, Default)]
pub struct EventCollection {
    events: Vec<Event>,
    // highest id ever inserted, kept after removals
    last_id: i64,
}

/// Display order: newer dates first, then higher ids first.
fn display_order(a: &Event, b: &Event) -> Ordering {
    b.date.cmp(&a.date).then_with(|| b.id().cmp(&a.id()))
}

impl EventCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from saved events in any order.
    #[must_use]
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        let mut events: Vec<Event> = events.into_iter().collect();
        events.sort_by(display_order);
        let last_id = events.iter().map(Event::id).max().unwrap_or_default();
        Self { events, last_id }
    }

    /// One past the highest id this collection has held. Ids freed by a
    /// removal are not handed out again.
    #[must_use]
    pub const fn next_id(&self) -> i64 {
        self.last_id + 1
    }

    /// Inserts or replaces an event at the position implied by its date and id.
    pub fn insert(&mut self, event: Event) {
        self.remove(event.id());
        self.last_id = self.last_id.max(event.id());
        let index = self
            .events
            .partition_point(|existing| display_order(existing, &event) == Ordering::Less);
        self.events.insert(index, event);
    }

    /// Removes and returns an event.
    pub fn remove(&mut self, id: i64) -> Option<Event> {
        let index = self.events.iter().position(|event| event.id() == id)?;
        Some(self.events.remove(index))
    }

    /// Looks up an event.
    ///
    /// # Errors
    /// [`Error::EventNotFound`] when the id is unknown.
    pub fn get(&self, id: i64) -> Result<&Event> {
        self.events
            .iter()
            .find(|event| event.id() == id)
            .ok_or(Error::EventNotFound { id })
    }

    /// Events in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Number of saved events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether there are no saved events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<'a> IntoIterator for &'a EventCollection {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(id: i64, day: u32) -> Event {
        let mut event = Event::new(Utc.with_ymd_and_hms(2009, 5, day, 0, 0, 0).unwrap());
        event.assign_id(id);
        event
    }

    fn ids(collection: &EventCollection) -> Vec<i64> {
        collection.iter().map(Event::id).collect()
    }

    #[test]
    fn test_insert_keeps_descending_order() {
        let mut collection = EventCollection::new();
        collection.insert(event(1, 6));
        collection.insert(event(2, 9));
        collection.insert(event(3, 7));
        collection.insert(event(4, 9));

        assert_eq!(ids(&collection), [4, 2, 3, 1]);
    }

    #[test]
    fn test_reinsert_moves_changed_event() {
        let mut collection = EventCollection::from_events([event(1, 6), event(2, 7), event(3, 8)]);
        assert_eq!(ids(&collection), [3, 2, 1]);

        let mut moved = collection.get(1).unwrap().clone();
        moved.date = Utc.with_ymd_and_hms(2009, 5, 10, 0, 0, 0).unwrap();
        collection.insert(moved);

        assert_eq!(ids(&collection), [1, 3, 2]);
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn test_next_id_is_max_plus_one() {
        let mut collection = EventCollection::new();
        assert_eq!(collection.next_id(), 1);
        collection.insert(event(5, 6));
        collection.insert(event(2, 6));
        assert_eq!(collection.next_id(), 6);

        collection.remove(5);
        assert_eq!(collection.next_id(), 6);
    }

    #[test]
    fn test_remove_and_missing_lookup() {
        let mut collection = EventCollection::from_events([event(1, 6)]);
        assert!(collection.remove(1).is_some());
        assert!(collection.remove(1).is_none());
        assert!(matches!(
            collection.get(1),
            Err(Error::EventNotFound { id: 1 })
        ));
        assert!(collection.is_empty());
    }
}
