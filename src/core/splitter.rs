//! Share splitter - turns an event total into exact per-person shares.
//!
//! Every sharing participant first gets its base share (`additional_amount`
//! plus its tip). Every base share, fixed or extra, is taken out of the pool;
//! what is left is divided among the non-fixed sharers one at a time. Each
//! step rounds `pool / people_left`, so the last participant served receives
//! exactly what remains and the shares always add up to the total.
//!
//! Participants are served in reverse scan order: the last sharer found gets
//! the first increment. Any odd cent therefore lands on the sharers served
//! first. That order is part of the observable behaviour and must stay stable.

use crate::{
    core::{
        ledger::Ledger,
        money::{Cents, round_half_up},
        participation::Participation,
    },
    errors::Result,
};
use tracing::{debug, warn};

/// How a recalculation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitOutcome {
    /// The shares add up to the event total.
    Complete,
    /// Base shares exceed the total; the negative pool was not distributed and
    /// non-fixed sharers hold only their base share. Correction is up to the caller.
    Unresolved {
        /// The negative remainder
        pool: Cents,
    },
    /// A positive pool remained but nobody takes part in the even split.
    Undistributed {
        /// The amount nobody was assigned
        pool: Cents,
    },
}

impl SplitOutcome {
    /// Whether the shares add up to the total.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Recomputes every participation's `total` for an event worth `total` cents.
///
/// Share changes are posted to the ledger as they are assigned.
///
/// # Errors
/// [`crate::errors::Error::PersonNotFound`] if a participation names a person
/// missing from the ledger; this is checked before anything is modified.
#[allow(clippy::cast_precision_loss)]
pub fn recalculate_shares(
    total: Cents,
    tip_percent: f64,
    participations: &mut [Participation],
    ledger: &mut Ledger,
) -> Result<SplitOutcome> {
    for part in participations.iter() {
        ledger.get(part.person_id)?;
    }

    let mut pool = total;
    // (index, base share) of each non-fixed sharer, in scan order
    let mut even_split: Vec<(usize, Cents)> = Vec::new();

    for (index, part) in participations.iter_mut().enumerate() {
        if !part.is_sharing {
            part.set_total(0, ledger)?;
            continue;
        }

        let base = part.base_share(tip_percent);
        pool -= base;
        if part.share_is_fixed {
            part.set_total(base, ledger)?;
        } else {
            even_split.push((index, base));
        }
    }

    if pool < 0 {
        warn!(
            total,
            pool, "Fixed and extra shares exceed the event total, remainder left unresolved"
        );
        for (index, base) in even_split {
            participations[index].set_total(base, ledger)?;
        }
        return Ok(SplitOutcome::Unresolved { pool });
    }

    if even_split.is_empty() {
        if pool != 0 {
            debug!(total, pool, "No participant left to take the remainder");
            return Ok(SplitOutcome::Undistributed { pool });
        }
        return Ok(SplitOutcome::Complete);
    }

    let mut people_left = even_split.len();
    while let Some((index, base)) = even_split.pop() {
        let share = round_half_up(pool as f64 / people_left as f64);
        participations[index].set_total(base + share, ledger)?;
        pool -= share;
        people_left -= 1;
    }

    debug!(total, "Shares recalculated");
    Ok(SplitOutcome::Complete)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{participation::base_share, person::Person};

    fn ledger_with(count: usize) -> Ledger {
        let mut ledger = Ledger::new();
        for i in 0..count {
            ledger.add(Person::new(format!("Person {i}")));
        }
        ledger
    }

    fn sharers(count: i64) -> Vec<Participation> {
        (1..=count)
            .map(|person_id| {
                let mut part = Participation::new(1, person_id);
                part.is_sharing = true;
                part
            })
            .collect()
    }

    fn totals(parts: &[Participation]) -> Vec<Cents> {
        parts.iter().map(Participation::total).collect()
    }

    #[test]
    fn test_three_way_split_follows_reverse_scan_order() {
        let mut ledger = ledger_with(3);
        let mut parts = sharers(3);

        let outcome = recalculate_shares(9988, 5.0, &mut parts, &mut ledger).unwrap();

        assert_eq!(outcome, SplitOutcome::Complete);
        // Last scanned gets round(9988 / 3), then round(6659 / 2), then the rest
        assert_eq!(totals(&parts), [3329, 3330, 3329]);
        assert_eq!(totals(&parts).iter().sum::<Cents>(), 9988);
    }

    #[test]
    fn test_fixed_share_is_taken_out_of_pool() {
        let mut ledger = ledger_with(3);
        let mut parts = sharers(3);
        parts[0].share_is_fixed = true;
        parts[0].additional_amount = 2000;

        recalculate_shares(9988, 5.0, &mut parts, &mut ledger).unwrap();

        assert_eq!(totals(&parts), [2100, 3944, 3944]);
    }

    #[test]
    fn test_extra_amount_added_on_top_of_equal_share() {
        let mut ledger = ledger_with(2);
        let mut parts = sharers(2);
        parts[1].additional_amount = 1000;

        // Pool after extra: 5000 - 1100 = 3900, split 1950 each
        recalculate_shares(5000, 10.0, &mut parts, &mut ledger).unwrap();

        assert_eq!(totals(&parts), [1950, 3050]);
    }

    #[test]
    fn test_fixed_share_isolated_from_sharer_count() {
        for others in 1..8 {
            let mut ledger = ledger_with(others + 1);
            let mut parts = sharers(i64::try_from(others).unwrap() + 1);
            parts[0].share_is_fixed = true;
            parts[0].additional_amount = 1234;

            recalculate_shares(20_000, 18.0, &mut parts, &mut ledger).unwrap();

            assert_eq!(parts[0].total(), base_share(1234, 18.0));
        }
    }

    #[test]
    fn test_non_sharers_get_zero() {
        let mut ledger = ledger_with(3);
        let mut parts = sharers(3);
        parts[1].is_sharing = false;
        parts[1].additional_amount = 500;

        recalculate_shares(1001, 0.0, &mut parts, &mut ledger).unwrap();

        assert_eq!(totals(&parts), [500, 0, 501]);
    }

    #[test]
    fn test_split_is_complete_for_many_totals() {
        for count in 1..=7 {
            for total in [0, 1, 2, 99, 100, 101, 9988, 12_345, 99_999] {
                let mut ledger = ledger_with(count);
                let mut parts = sharers(i64::try_from(count).unwrap());
                parts[0].additional_amount = 1;

                let outcome = recalculate_shares(total, 7.5, &mut parts, &mut ledger).unwrap();

                if total >= 1 {
                    assert!(outcome.is_complete());
                    assert_eq!(totals(&parts).iter().sum::<Cents>(), total);
                    assert_eq!(ledger.net(), -total);
                }
            }
        }
    }

    #[test]
    fn test_recalculation_is_idempotent() {
        let mut ledger = ledger_with(4);
        let mut parts = sharers(4);
        parts[2].additional_amount = 333;

        recalculate_shares(10_001, 15.0, &mut parts, &mut ledger).unwrap();
        let first = totals(&parts);
        let balances: Vec<Cents> = ledger.iter().map(|p| p.balance).collect();

        recalculate_shares(10_001, 15.0, &mut parts, &mut ledger).unwrap();
        assert_eq!(totals(&parts), first);
        assert_eq!(ledger.iter().map(|p| p.balance).collect::<Vec<_>>(), balances);
    }

    #[test]
    fn test_negative_pool_left_unresolved() {
        let mut ledger = ledger_with(2);
        let mut parts = sharers(2);
        parts[0].share_is_fixed = true;
        parts[0].additional_amount = 3000;
        parts[1].additional_amount = 500;

        let outcome = recalculate_shares(2000, 0.0, &mut parts, &mut ledger).unwrap();

        assert_eq!(outcome, SplitOutcome::Unresolved { pool: -1500 });
        assert_eq!(totals(&parts), [3000, 500]);
    }

    #[test]
    fn test_only_fixed_sharers_leave_remainder_undistributed() {
        let mut ledger = ledger_with(1);
        let mut parts = sharers(1);
        parts[0].share_is_fixed = true;
        parts[0].additional_amount = 400;

        let outcome = recalculate_shares(1000, 0.0, &mut parts, &mut ledger).unwrap();

        assert_eq!(outcome, SplitOutcome::Undistributed { pool: 600 });
        assert_eq!(parts[0].total(), 400);
    }

    #[test]
    fn test_unknown_person_rejected_before_any_change() {
        let mut ledger = ledger_with(1);
        let mut parts = sharers(2);

        let result = recalculate_shares(1000, 0.0, &mut parts, &mut ledger);

        assert!(result.is_err());
        assert_eq!(totals(&parts), [0, 0]);
        assert_eq!(ledger.net(), 0);
    }
}
