//! Balance report generation.
//!
//! Produces structured data that the binary (or any other front end) formats.

use crate::core::{
    ledger::Ledger,
    money::{Cents, format_cents},
    person::PersonSort,
};

/// One line of the balance report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceLine {
    /// Person id
    pub person_id: i64,
    /// Person name
    pub name: String,
    /// Balance in cents; positive means the group owes this person
    pub balance: Cents,
    /// Balance formatted for display
    pub formatted: String,
}

/// Balances of everybody in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReport {
    /// One line per person, in the requested order
    pub lines: Vec<BalanceLine>,
    /// Sum of every balance
    pub net: Cents,
}

impl BalanceReport {
    /// Builds the report from the ledger in the given order.
    #[must_use]
    pub fn from_ledger(ledger: &Ledger, sort: PersonSort) -> Self {
        let lines = ledger
            .sorted(sort)
            .into_iter()
            .map(|person| BalanceLine {
                person_id: person.id,
                name: person.name.clone(),
                balance: person.balance,
                formatted: format_cents(person.balance),
            })
            .collect();

        Self {
            lines,
            net: ledger.net(),
        }
    }

    /// Whether the balances cancel out, which holds when every event is fully split.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.net == 0
    }
}
