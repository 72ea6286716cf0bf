//! Tracker - the unit-of-work service in front of the engine.
//!
//! The tracker holds the in-memory ledger and event collection loaded from the
//! database. Edits happen on an [`EventEditor`], which owns private copies of
//! the event and the ledger, so nothing the tracker publishes changes until a
//! save commits. Each save or delete writes the event, its participations and
//! every person whose balance moved inside one database transaction; the
//! in-memory state is replaced only after that transaction commits, so a failed
//! write leaves the tracker exactly as it was.

use crate::{
    config::settings::SeedPerson,
    core::{
        BalanceDrift, BalanceReport, Cents, Event, EventCollection, Ledger, Person, PersonSort,
        SplitOutcome,
    },
    db,
    errors::{Error, Result},
    snapshot::{self, Snapshot, v2},
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tracing::{debug, error, info, instrument, warn};

/// Tip rate used when no setting overrides it.
pub const DEFAULT_TIP_PERCENT: f64 = 15.0;

/// A draft of one event, edited against a private copy of the ledger.
///
/// Balances shown by [`EventEditor::ledger`] already include the draft's
/// effect, which is what an edit screen wants to preview.
#[derive(Debug, Clone)]
pub struct EventEditor {
    event: Event,
    ledger: Ledger,
    base_revision: u64,
}

impl EventEditor {
    /// The event being edited.
    #[must_use]
    pub const fn event(&self) -> &Event {
        &self.event
    }

    /// The ledger including this draft's changes.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.event.description = description.into();
    }

    /// Sets the date; the event moves in the listing when saved.
    pub fn set_date(&mut self, date: DateTime<Utc>) {
        self.event.date = date;
    }

    /// See [`Event::set_subtotal`].
    ///
    /// # Errors
    /// [`Error::PersonNotFound`] for a payer or participant missing from the ledger.
    pub fn set_subtotal(&mut self, amount: Cents) -> Result<SplitOutcome> {
        self.event.set_subtotal(amount, &mut self.ledger)
    }

    /// See [`Event::set_tip_percent`].
    ///
    /// # Errors
    /// [`Error::PersonNotFound`] for a payer or participant missing from the ledger.
    pub fn set_tip_percent(&mut self, percent: f64) -> Result<SplitOutcome> {
        self.event.set_tip_percent(percent, &mut self.ledger)
    }

    /// See [`Event::set_total`].
    ///
    /// # Errors
    /// [`Error::PersonNotFound`] for a payer or participant missing from the ledger.
    pub fn set_total(&mut self, total: Cents) -> Result<SplitOutcome> {
        self.event.set_total(total, &mut self.ledger)
    }

    /// See [`Event::set_payer`].
    ///
    /// # Errors
    /// [`Error::PersonNotFound`] for an unknown payer.
    pub fn set_payer(&mut self, payer_id: Option<i64>) -> Result<()> {
        self.event.set_payer(payer_id, &mut self.ledger)
    }

    /// See [`Event::set_sharing`].
    ///
    /// # Errors
    /// [`Error::PersonNotFound`] for an unknown person.
    pub fn set_sharing(&mut self, person_id: i64, is_sharing: bool) -> Result<SplitOutcome> {
        self.event.set_sharing(person_id, is_sharing, &mut self.ledger)
    }

    /// See [`Event::set_share_fixed`].
    ///
    /// # Errors
    /// [`Error::PersonNotFound`] for an unknown person.
    pub fn set_share_fixed(&mut self, person_id: i64, share_is_fixed: bool) -> Result<SplitOutcome> {
        self.event
            .set_share_fixed(person_id, share_is_fixed, &mut self.ledger)
    }

    /// See [`Event::set_additional_amount`].
    ///
    /// # Errors
    /// [`Error::PersonNotFound`] for an unknown person.
    pub fn set_additional_amount(&mut self, person_id: i64, amount: Cents) -> Result<SplitOutcome> {
        self.event
            .set_additional_amount(person_id, amount, &mut self.ledger)
    }
}

/// In-memory engine state backed by the database.
#[derive(Debug)]
pub struct Tracker {
    db: DatabaseConnection,
    ledger: Ledger,
    events: EventCollection,
    // bumped on every commit; editors opened on an older revision are stale
    revision: u64,
    default_tip_percent: f64,
}

impl Tracker {
    /// Loads every person and event from the database.
    #[instrument(skip(db))]
    pub async fn open(db: DatabaseConnection) -> Result<Self> {
        let people = db::load_people(&db).await?;
        let events = db::load_events(&db).await?;
        info!(
            people = people.len(),
            events = events.len(),
            "Loaded ledger from database"
        );

        Ok(Self {
            db,
            ledger: Ledger::from_people(people),
            events: EventCollection::from_events(events),
            revision: 0,
            default_tip_percent: DEFAULT_TIP_PERCENT,
        })
    }

    /// Sets the tip rate new events start with.
    #[must_use]
    pub fn with_default_tip_percent(mut self, percent: f64) -> Self {
        self.default_tip_percent = percent;
        self
    }

    /// The committed ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The committed events, newest first.
    #[must_use]
    pub const fn events(&self) -> &EventCollection {
        &self.events
    }

    /// Looks up a person.
    ///
    /// # Errors
    /// [`Error::PersonNotFound`] when the id is unknown.
    pub fn person(&self, id: i64) -> Result<&Person> {
        self.ledger.get(id)
    }

    /// Looks up a saved event.
    ///
    /// # Errors
    /// [`Error::EventNotFound`] when the id is unknown.
    pub fn event(&self, id: i64) -> Result<&Event> {
        self.events.get(id)
    }

    /// Adds a person with a fresh id and position and saves it.
    #[instrument(skip(self))]
    pub async fn add_person(&mut self, name: &str) -> Result<Person> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidName {
                name: name.to_string(),
            });
        }

        let mut ledger = self.ledger.clone();
        let id = ledger.add(Person::new(name));
        let person = ledger.get(id)?.clone();

        let txn = self.db.begin().await?;
        db::persist_person(&txn, &person).await?;
        txn.commit()
            .await
            .inspect_err(|e| error!("Failed to save person {name}: {e}"))?;

        self.publish(ledger);
        info!(id, "Person added");
        Ok(person)
    }

    /// Adds every seed person whose name is not in the ledger yet.
    ///
    /// Returns the number of people added.
    pub async fn seed_people(&mut self, seeds: &[SeedPerson]) -> Result<usize> {
        let mut added = 0;
        for seed in seeds {
            if self.ledger.find_by_name(seed.name.trim()).is_some() {
                debug!("Person {} already exists, skipping", seed.name);
                continue;
            }
            self.add_person(&seed.name).await?;
            added += 1;
        }
        Ok(added)
    }

    /// Starts a new, unsaved event at the default tip rate.
    ///
    /// # Errors
    /// Propagates ledger errors, which cannot occur for an empty event.
    pub fn new_event(&self, date: DateTime<Utc>) -> Result<EventEditor> {
        let mut editor = EventEditor {
            event: Event::new(date),
            ledger: self.ledger.clone(),
            base_revision: self.revision,
        };
        editor.set_tip_percent(self.default_tip_percent)?;
        Ok(editor)
    }

    /// Opens a saved event for editing.
    ///
    /// # Errors
    /// [`Error::EventNotFound`] when the id is unknown.
    pub fn edit_event(&self, id: i64) -> Result<EventEditor> {
        Ok(EventEditor {
            event: self.events.get(id)?.clone(),
            ledger: self.ledger.clone(),
            base_revision: self.revision,
        })
    }

    /// Saves an editor's event and publishes its ledger.
    ///
    /// A new event receives its id here. Participations that are not stored
    /// are dropped from the published event and from the editor, so the
    /// in-memory event matches what a reload returns. The editor stays usable
    /// afterwards and can be saved again.
    ///
    /// # Errors
    /// [`Error::StaleEdit`] if anything was committed since the editor was
    /// opened, or [`Error::Database`] if the write fails. In both cases the
    /// tracker and the editor are unchanged.
    #[instrument(skip(self, editor), fields(event_id = editor.event.id()))]
    pub async fn save_event(&mut self, editor: &mut EventEditor) -> Result<i64> {
        if editor.base_revision != self.revision {
            warn!("Rejecting save of an outdated editor");
            return Err(Error::StaleEdit {
                event_id: editor.event.id(),
            });
        }

        let mut event = editor.event.clone();
        if event.is_new() {
            event.assign_id(self.events.next_id());
        }
        event.retain_kept_participations();

        let txn = self.db.begin().await?;
        db::persist_event(&txn, &event).await?;
        self.persist_changed(&txn, &editor.ledger).await?;
        txn.commit()
            .await
            .inspect_err(|e| error!("Failed to save event {}: {e}", event.id()))?;

        let id = event.id();
        editor.event = event.clone();
        self.events.insert(event);
        self.publish(editor.ledger.clone());
        editor.base_revision = self.revision;
        info!(id, "Event saved");
        Ok(id)
    }

    /// Reverses an event's effect on every balance, then deletes it.
    ///
    /// # Errors
    /// [`Error::EventNotFound`] or [`Error::Database`]; the tracker is
    /// unchanged on error.
    #[instrument(skip(self))]
    pub async fn delete_event(&mut self, id: i64) -> Result<()> {
        let mut event = self.events.get(id)?.clone();
        let mut ledger = self.ledger.clone();
        event.clear(&mut ledger)?;

        let txn = self.db.begin().await?;
        db::delete_event(&txn, id).await?;
        self.persist_changed(&txn, &ledger).await?;
        txn.commit()
            .await
            .inspect_err(|e| error!("Failed to delete event {id}: {e}"))?;

        self.events.remove(id);
        self.publish(ledger);
        info!(id, "Event deleted");
        Ok(())
    }

    /// Compares stored balances with a full replay of the events.
    ///
    /// # Errors
    /// [`Error::PersonNotFound`] if an event references an unknown person.
    pub fn audit(&self) -> Result<Vec<BalanceDrift>> {
        self.ledger.audit(&self.events)
    }

    /// Replaces every balance with a full replay and saves the people that
    /// changed. Returns how many balances were corrected.
    #[instrument(skip(self))]
    pub async fn rebuild_balances(&mut self) -> Result<usize> {
        let mut ledger = self.ledger.clone();
        ledger.recalculate_all(&self.events)?;
        let changed = ledger.changed_since(&self.ledger).count();
        if changed == 0 {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        self.persist_changed(&txn, &ledger).await?;
        txn.commit().await?;

        self.publish(ledger);
        info!(changed, "Balances rebuilt from event history");
        Ok(changed)
    }

    /// Balances of everybody in the requested order.
    #[must_use]
    pub fn report(&self, sort: PersonSort) -> BalanceReport {
        BalanceReport::from_ledger(&self.ledger, sort)
    }

    /// Captures the committed state as a current-version snapshot.
    #[must_use]
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot::V2(v2::Document::capture(self.ledger.iter(), &self.events))
    }

    /// Loads a snapshot of any version into an empty tracker.
    ///
    /// # Errors
    /// [`Error::Snapshot`] if the tracker already holds data or the document is
    /// invalid; [`Error::Database`] if the write fails.
    #[instrument(skip(self, snapshot))]
    pub async fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        if !self.ledger.is_empty() || !self.events.is_empty() {
            return Err(Error::Snapshot {
                message: "Snapshots can only be imported into an empty store".to_string(),
            });
        }

        let document = snapshot::migrate(snapshot)?;
        let net = snapshot::net_balance(&document);
        let (people, events) = document.into_records()?;

        let txn = self.db.begin().await?;
        for person in &people {
            db::persist_person(&txn, person).await?;
        }
        for event in &events {
            db::persist_event(&txn, event).await?;
        }
        txn.commit().await?;

        info!(
            people = people.len(),
            events = events.len(),
            net,
            "Snapshot imported"
        );
        self.events = EventCollection::from_events(events);
        self.publish(Ledger::from_people(people));
        Ok(())
    }

    async fn persist_changed<C>(&self, txn: &C, ledger: &Ledger) -> Result<()>
    where
        C: ConnectionTrait,
    {
        for person in ledger.changed_since(&self.ledger) {
            db::persist_person(txn, person).await?;
        }
        Ok(())
    }

    fn publish(&mut self, ledger: Ledger) {
        self.ledger = ledger;
        self.revision += 1;
    }
}
