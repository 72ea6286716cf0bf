//! Person ledger - the arena of people addressed by id.
//!
//! Events and participations refer to people only by id; every balance change
//! goes through this ledger so it can be replayed and audited against the full
//! event history.

use crate::{
    core::{
        event::Event,
        money::Cents,
        person::{Person, PersonSort},
    },
    errors::{Error, Result},
};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// A person whose stored balance disagrees with a replay of the event history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceDrift {
    /// The affected person
    pub person_id: i64,
    /// Balance currently held by the ledger
    pub stored: Cents,
    /// Balance obtained by replaying every event from zero
    pub replayed: Cents,
}

/// All known people, keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    people: BTreeMap<i64, Person>,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from already-saved people (ids must be non-zero).
    #[must_use]
    pub fn from_people(people: impl IntoIterator<Item = Person>) -> Self {
        Self {
            people: people.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    /// Returns an id no person has used: one past the highest id.
    #[must_use]
    pub fn next_id(&self) -> i64 {
        self.people.keys().next_back().map_or(1, |id| id + 1)
    }

    fn next_position(&self) -> i64 {
        self.people
            .values()
            .map(|p| p.position)
            .max()
            .map_or(1, |position| position + 1)
    }

    /// Adds a person, allocating a fresh id and position when it has none.
    ///
    /// A person that already carries an id is stored under that id as-is.
    /// Returns the person's id.
    pub fn add(&mut self, mut person: Person) -> i64 {
        if person.id == 0 {
            person.id = self.next_id();
            person.position = self.next_position();
            debug!(id = person.id, name = %person.name, "Added person");
        }
        let id = person.id;
        self.people.insert(id, person);
        id
    }

    /// Looks up a person.
    ///
    /// # Errors
    /// [`Error::PersonNotFound`] when the id is unknown.
    pub fn get(&self, id: i64) -> Result<&Person> {
        self.people.get(&id).ok_or(Error::PersonNotFound { id })
    }

    fn get_mut(&mut self, id: i64) -> Result<&mut Person> {
        self.people.get_mut(&id).ok_or(Error::PersonNotFound { id })
    }

    /// Whether a person with this id exists.
    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.people.contains_key(&id)
    }

    /// Number of people.
    #[must_use]
    pub fn len(&self) -> usize {
        self.people.len()
    }

    /// Whether the ledger holds nobody.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// People in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.people.values()
    }

    /// People ordered for display.
    #[must_use]
    pub fn sorted(&self, sort: PersonSort) -> Vec<&Person> {
        let mut list: Vec<&Person> = self.people.values().collect();
        list.sort_by(|a, b| sort.compare(a, b));
        list
    }

    /// Finds a person by exact name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Person> {
        self.people.values().find(|p| p.name == name)
    }

    /// Credits a person.
    ///
    /// # Errors
    /// [`Error::PersonNotFound`] or [`Error::InvalidAmount`]; nothing changes on error.
    pub fn credit(&mut self, id: i64, amount: Cents) -> Result<()> {
        self.get_mut(id)?.credit(amount)
    }

    /// Debits a person.
    ///
    /// # Errors
    /// [`Error::PersonNotFound`] or [`Error::InvalidAmount`]; nothing changes on error.
    pub fn debit(&mut self, id: i64, amount: Cents) -> Result<()> {
        self.get_mut(id)?.debit(amount)
    }

    /// Credits an amount that may itself be negative.
    ///
    /// A negative amount is posted as a debit of its absolute value, so
    /// reversing a negative total never trips the strict argument check.
    pub(crate) fn post_credit(&mut self, id: i64, amount: Cents) -> Result<()> {
        trace!(id, amount, "Posting credit");
        if amount < 0 {
            self.debit(id, -amount)
        } else {
            self.credit(id, amount)
        }
    }

    /// Debits an amount that may itself be negative. See [`Ledger::post_credit`].
    pub(crate) fn post_debit(&mut self, id: i64, amount: Cents) -> Result<()> {
        trace!(id, amount, "Posting debit");
        if amount < 0 {
            self.credit(id, -amount)
        } else {
            self.debit(id, amount)
        }
    }

    /// Computes every person's balance from zero by replaying `events`.
    ///
    /// The payer of each event is credited its total and every participant is
    /// debited its share.
    ///
    /// # Errors
    /// [`Error::PersonNotFound`] if an event references an unknown person.
    pub fn replay<'a>(
        &self,
        events: impl IntoIterator<Item = &'a Event>,
    ) -> Result<BTreeMap<i64, Cents>> {
        let mut balances: BTreeMap<i64, Cents> = self.people.keys().map(|id| (*id, 0)).collect();

        for event in events {
            if let Some(payer_id) = event.payer_id() {
                *balances
                    .get_mut(&payer_id)
                    .ok_or(Error::PersonNotFound { id: payer_id })? += event.total();
            }
            for part in event.participations() {
                *balances
                    .get_mut(&part.person_id)
                    .ok_or(Error::PersonNotFound { id: part.person_id })? -= part.total();
            }
        }

        Ok(balances)
    }

    /// Replaces every balance with the result of [`Ledger::replay`].
    ///
    /// # Errors
    /// [`Error::PersonNotFound`]; the ledger is left untouched on error.
    pub fn recalculate_all<'a>(&mut self, events: impl IntoIterator<Item = &'a Event>) -> Result<()> {
        let balances = self.replay(events)?;
        for (id, balance) in balances {
            if let Some(person) = self.people.get_mut(&id) {
                person.balance = balance;
            }
        }
        debug!(people = self.people.len(), "Recalculated all balances");
        Ok(())
    }

    /// Lists people whose stored balance differs from a full replay.
    ///
    /// # Errors
    /// [`Error::PersonNotFound`] if an event references an unknown person.
    pub fn audit<'a>(&self, events: impl IntoIterator<Item = &'a Event>) -> Result<Vec<BalanceDrift>> {
        let balances = self.replay(events)?;
        Ok(self
            .people
            .values()
            .filter_map(|person| {
                let replayed = balances.get(&person.id).copied().unwrap_or_default();
                (replayed != person.balance).then_some(BalanceDrift {
                    person_id: person.id,
                    stored: person.balance,
                    replayed,
                })
            })
            .collect())
    }

    /// People that are new or differ from their counterpart in `base`.
    pub fn changed_since<'a>(&'a self, base: &'a Self) -> impl Iterator<Item = &'a Person> {
        self.people
            .values()
            .filter(move |person| base.people.get(&person.id) != Some(*person))
    }

    /// Sum of all balances. Zero whenever every event is fully split.
    #[must_use]
    pub fn net(&self) -> Cents {
        self.people.values().map(|p| p.balance).sum()
    }
}
