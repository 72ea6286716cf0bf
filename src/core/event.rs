//! Event model - one shared bill.
//!
//! An event keeps subtotal, tip percentage and total consistent with one
//! another and forwards every change of its total to the payer's balance.
//! Per-person shares are delegated to the splitter after each edit.
//!
//! The event never owns people. Every mutating call takes the [`Ledger`] that
//! holds them, and every call validates the ids it will touch before the first
//! posting so an error leaves both the event and the ledger unchanged.

use crate::{
    core::{
        ledger::Ledger,
        money::{Cents, checked_round_half_up, tip_amount},
        participation::Participation,
        splitter::{self, SplitOutcome},
    },
    errors::Result,
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Id 0 marks an event that has not been saved yet.
pub const UNSAVED: i64 = 0;

/// A bill shared by a group.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    id: i64,
    /// Free-form description, may be empty
    pub description: String,
    subtotal: Cents,
    tip_percent: f64,
    total: Cents,
    /// When the event happened; events are listed newest first
    pub date: DateTime<Utc>,
    payer_id: Option<i64>,
    participations: Vec<Participation>,
}

impl Event {
    /// Creates an unsaved, empty event.
    #[must_use]
    pub fn new(date: DateTime<Utc>) -> Self {
        Self {
            id: UNSAVED,
            description: String::new(),
            subtotal: 0,
            tip_percent: 0.0,
            total: 0,
            date,
            payer_id: None,
            participations: Vec::new(),
        }
    }

    /// Rebuilds a persisted event without touching any balance.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: i64,
        description: String,
        subtotal: Cents,
        tip_percent: f64,
        total: Cents,
        date: DateTime<Utc>,
        payer_id: Option<i64>,
        participations: Vec<Participation>,
    ) -> Self {
        Self {
            id,
            description,
            subtotal,
            tip_percent,
            total,
            date,
            payer_id,
            participations,
        }
    }

    /// The event id, [`UNSAVED`] until first saved.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// Whether the event has never been saved.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.id == UNSAVED
    }

    /// Cost before tip, in cents.
    #[must_use]
    pub const fn subtotal(&self) -> Cents {
        self.subtotal
    }

    /// Tip rate as a percentage of the subtotal.
    #[must_use]
    pub const fn tip_percent(&self) -> f64 {
        self.tip_percent
    }

    /// Total cost with tip, in cents.
    #[must_use]
    pub const fn total(&self) -> Cents {
        self.total
    }

    /// Tip amount in cents for the current subtotal and rate.
    #[must_use]
    pub fn tip_amount(&self) -> Cents {
        tip_amount(self.subtotal, self.tip_percent)
    }

    /// The person who fronted the total.
    #[must_use]
    pub const fn payer_id(&self) -> Option<i64> {
        self.payer_id
    }

    /// All participation records in the order they were first referenced.
    #[must_use]
    pub fn participations(&self) -> &[Participation] {
        &self.participations
    }

    /// The participation of one person, if it was ever referenced.
    #[must_use]
    pub fn participation(&self, person_id: i64) -> Option<&Participation> {
        self.participations
            .iter()
            .find(|part| part.person_id == person_id)
    }

    /// Participations that must be persisted.
    pub fn kept_participations(&self) -> impl Iterator<Item = &Participation> {
        self.participations
            .iter()
            .filter(|part| part.is_worth_keeping())
    }

    /// Sets the subtotal and recomputes the total from the current tip rate.
    ///
    /// # Errors
    /// [`crate::errors::Error::PersonNotFound`] if the payer or a participant
    /// is missing from the ledger.
    pub fn set_subtotal(&mut self, amount: Cents, ledger: &mut Ledger) -> Result<SplitOutcome> {
        self.ensure_people(ledger)?;
        let total = amount.saturating_add(tip_amount(amount, self.tip_percent));
        self.apply_total(total, ledger)?;
        self.subtotal = amount;
        self.recalculate_shares(ledger)
    }

    /// Sets the tip rate and recomputes the total from the current subtotal.
    ///
    /// # Errors
    /// See [`Event::set_subtotal`].
    pub fn set_tip_percent(&mut self, percent: f64, ledger: &mut Ledger) -> Result<SplitOutcome> {
        self.ensure_people(ledger)?;
        let total = self.subtotal.saturating_add(tip_amount(self.subtotal, percent));
        self.apply_total(total, ledger)?;
        self.tip_percent = percent;
        self.recalculate_shares(ledger)
    }

    /// Sets the total directly and back-derives the other two figures.
    ///
    /// Without a subtotal, the subtotal becomes the total (no tip) or the total
    /// with the tip taken out, rounded to cents. When the tip cannot be taken
    /// out (a rate of -100%), the subtotal is the total. With a subtotal, the
    /// tip rate is recomputed from the ratio, replacing any previous rate.
    ///
    /// # Errors
    /// See [`Event::set_subtotal`].
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn set_total(&mut self, total: Cents, ledger: &mut Ledger) -> Result<SplitOutcome> {
        self.ensure_people(ledger)?;
        self.apply_total(total, ledger)?;

        if self.subtotal == 0 {
            // a -100% tip has no inverse; keep the total as the subtotal then
            self.subtotal = if self.tip_percent == 0.0 {
                total
            } else {
                checked_round_half_up(total as f64 / ((self.tip_percent + 100.0) / 100.0))
                    .unwrap_or(total)
            };
        } else {
            self.tip_percent = (total as f64 / self.subtotal as f64) * 100.0 - 100.0;
        }

        self.recalculate_shares(ledger)
    }

    /// Moves the total from the old payer's balance to the new payer's.
    ///
    /// # Errors
    /// [`crate::errors::Error::PersonNotFound`] for an unknown new or old payer.
    pub fn set_payer(&mut self, payer_id: Option<i64>, ledger: &mut Ledger) -> Result<()> {
        for id in payer_id.iter().chain(self.payer_id.iter()) {
            ledger.get(*id)?;
        }

        if let Some(old) = self.payer_id {
            ledger.post_debit(old, self.total)?;
        }
        self.payer_id = payer_id;
        if let Some(new) = self.payer_id {
            ledger.post_credit(new, self.total)?;
        }
        debug!(event = self.id, payer = ?payer_id, "Payer changed");
        Ok(())
    }

    /// Turns a person's participation in the split on or off.
    ///
    /// # Errors
    /// See [`Event::set_subtotal`].
    pub fn set_sharing(
        &mut self,
        person_id: i64,
        is_sharing: bool,
        ledger: &mut Ledger,
    ) -> Result<SplitOutcome> {
        self.participation_entry(person_id, ledger)?.is_sharing = is_sharing;
        self.recalculate_shares(ledger)
    }

    /// Switches a person between a fixed share and an even share.
    ///
    /// # Errors
    /// See [`Event::set_subtotal`].
    pub fn set_share_fixed(
        &mut self,
        person_id: i64,
        share_is_fixed: bool,
        ledger: &mut Ledger,
    ) -> Result<SplitOutcome> {
        self.participation_entry(person_id, ledger)?.share_is_fixed = share_is_fixed;
        self.recalculate_shares(ledger)
    }

    /// Sets the pre-tip amount attributed to a person.
    ///
    /// # Errors
    /// See [`Event::set_subtotal`].
    pub fn set_additional_amount(
        &mut self,
        person_id: i64,
        amount: Cents,
        ledger: &mut Ledger,
    ) -> Result<SplitOutcome> {
        self.participation_entry(person_id, ledger)?.additional_amount = amount;
        self.recalculate_shares(ledger)
    }

    /// Recomputes every participant's share and posts the differences.
    ///
    /// # Errors
    /// [`crate::errors::Error::PersonNotFound`] for an unknown participant.
    pub fn recalculate_shares(&mut self, ledger: &mut Ledger) -> Result<SplitOutcome> {
        splitter::recalculate_shares(
            self.total,
            self.tip_percent,
            &mut self.participations,
            ledger,
        )
    }

    /// Drives the event's monetary effect to zero before it is deleted.
    ///
    /// Every participation stops sharing and its share is credited back first;
    /// then the total is taken back from the payer. Afterwards the ledger is as
    /// if the event never existed.
    ///
    /// # Errors
    /// See [`Event::set_subtotal`].
    pub fn clear(&mut self, ledger: &mut Ledger) -> Result<()> {
        self.ensure_people(ledger)?;
        for part in &mut self.participations {
            part.is_sharing = false;
            part.set_total(0, ledger)?;
        }
        self.apply_total(0, ledger)
    }

    /// Drops the participations that would not be stored.
    pub(crate) fn retain_kept_participations(&mut self) {
        self.participations.retain(Participation::is_worth_keeping);
    }

    /// Gives a new event its id, along with all of its participations.
    pub(crate) fn assign_id(&mut self, id: i64) {
        self.id = id;
        for part in &mut self.participations {
            part.event_id = id;
        }
    }

    /// Debits the payer for the old total and credits the new one, then stores it.
    fn apply_total(&mut self, total: Cents, ledger: &mut Ledger) -> Result<()> {
        if let Some(payer) = self.payer_id {
            ledger.post_debit(payer, self.total)?;
            ledger.post_credit(payer, total)?;
        }
        self.total = total;
        Ok(())
    }

    fn ensure_people(&self, ledger: &Ledger) -> Result<()> {
        if let Some(payer) = self.payer_id {
            ledger.get(payer)?;
        }
        for part in &self.participations {
            ledger.get(part.person_id)?;
        }
        Ok(())
    }

    fn participation_entry(
        &mut self,
        person_id: i64,
        ledger: &Ledger,
    ) -> Result<&mut Participation> {
        self.ensure_people(ledger)?;
        ledger.get(person_id)?;

        let index = match self
            .participations
            .iter()
            .position(|part| part.person_id == person_id)
        {
            Some(index) => index,
            None => {
                self.participations
                    .push(Participation::new(self.id, person_id));
                self.participations.len() - 1
            }
        };
        Ok(&mut self.participations[index])
    }
}
