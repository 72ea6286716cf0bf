//! One person's stake in one event.

use crate::{
    core::{
        ledger::Ledger,
        money::{Cents, tip_amount},
    },
    errors::Result,
};
use serde::{Deserialize, Serialize};

/// Tip-inclusive amount attributed to a participant before any even split:
/// `additional_amount + round(additional_amount * tip_percent / 100)`.
///
/// Fixed and extra participants use the same formula.
#[must_use]
pub fn base_share(additional_amount: Cents, tip_percent: f64) -> Cents {
    additional_amount + tip_amount(additional_amount, tip_percent)
}

/// Participation record, identified by `(event_id, person_id)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    /// Event this stake belongs to (0 while the event is unsaved)
    pub event_id: i64,
    /// Person holding the stake
    pub person_id: i64,
    /// Whether the person takes part in the split at all
    pub is_sharing: bool,
    /// If set, the tip-inclusive `additional_amount` is the whole share and
    /// the person stays out of the even split
    pub share_is_fixed: bool,
    /// Pre-tip amount attributed to this person (fixed share or extra)
    pub additional_amount: Cents,
    total: Cents,
}

impl Participation {
    /// Creates an empty, non-sharing participation.
    #[must_use]
    pub const fn new(event_id: i64, person_id: i64) -> Self {
        Self {
            event_id,
            person_id,
            is_sharing: false,
            share_is_fixed: false,
            additional_amount: 0,
            total: 0,
        }
    }

    /// Rebuilds a persisted participation, including its computed total.
    #[must_use]
    pub const fn restore(
        event_id: i64,
        person_id: i64,
        is_sharing: bool,
        share_is_fixed: bool,
        additional_amount: Cents,
        total: Cents,
    ) -> Self {
        Self {
            event_id,
            person_id,
            is_sharing,
            share_is_fixed,
            additional_amount,
            total,
        }
    }

    /// Final tip-inclusive share in cents, as last computed by the splitter.
    #[must_use]
    pub const fn total(&self) -> Cents {
        self.total
    }

    /// This participant's base share at the given tip rate.
    #[must_use]
    pub fn base_share(&self, tip_percent: f64) -> Cents {
        base_share(self.additional_amount, tip_percent)
    }

    /// Whether the record carries information worth persisting.
    #[must_use]
    pub const fn is_worth_keeping(&self) -> bool {
        self.is_sharing || self.total != 0
    }

    /// Replaces the computed share, moving the difference through the ledger:
    /// the old share is credited back and the new one debited.
    pub(crate) fn set_total(&mut self, total: Cents, ledger: &mut Ledger) -> Result<()> {
        if total == self.total {
            return Ok(());
        }
        ledger.post_credit(self.person_id, self.total)?;
        ledger.post_debit(self.person_id, total)?;
        self.total = total;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::person::Person;

    #[test]
    fn test_base_share_includes_tip() {
        assert_eq!(base_share(2000, 5.0), 2100);
        assert_eq!(base_share(0, 18.0), 0);
        assert_eq!(base_share(1250, 0.0), 1250);
    }

    #[test]
    fn test_worth_keeping() {
        let mut part = Participation::new(1, 1);
        assert!(!part.is_worth_keeping());
        part.is_sharing = true;
        assert!(part.is_worth_keeping());
        part.is_sharing = false;
        part.total = 30;
        assert!(part.is_worth_keeping());
    }

    #[test]
    fn test_set_total_moves_difference_through_ledger() {
        let mut ledger = Ledger::new();
        let id = ledger.add(Person::new("Alice"));
        let mut part = Participation::new(1, id);

        part.set_total(1500, &mut ledger).unwrap();
        assert_eq!(ledger.get(id).unwrap().balance, -1500);

        part.set_total(900, &mut ledger).unwrap();
        assert_eq!(ledger.get(id).unwrap().balance, -900);

        part.set_total(0, &mut ledger).unwrap();
        assert_eq!(ledger.get(id).unwrap().balance, 0);
    }

    #[test]
    fn test_set_total_negative_share() {
        let mut ledger = Ledger::new();
        let id = ledger.add(Person::new("Alice"));
        let mut part = Participation::new(1, id);

        part.set_total(-200, &mut ledger).unwrap();
        assert_eq!(ledger.get(id).unwrap().balance, 200);
        part.set_total(0, &mut ledger).unwrap();
        assert_eq!(ledger.get(id).unwrap().balance, 0);
    }
}
