//! Person records and their running balance.
//!
//! A balance works like a bank balance rather than a credit card balance: a
//! positive value means the group owes this person money.

use crate::{
    core::money::Cents,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Id 0 is reserved for "no person" / unsaved.
pub const NO_PERSON: i64 = 0;

/// One participant of the group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Unique, stable identifier (never 0 once added)
    pub id: i64,
    /// Display name
    pub name: String,
    /// Net position in cents (credited minus debited)
    pub balance: Cents,
    /// Manual ordering key
    pub position: i64,
}

impl Person {
    /// Creates an unsaved person with a zero balance.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NO_PERSON,
            name: name.into(),
            balance: 0,
            position: 0,
        }
    }

    /// Adds `amount` to the balance.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAmount`] for a negative amount; the balance is untouched.
    pub fn credit(&mut self, amount: Cents) -> Result<()> {
        if amount < 0 {
            return Err(Error::InvalidAmount { amount });
        }
        self.balance += amount;
        Ok(())
    }

    /// Withdraws `amount` from the balance.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAmount`] for a negative amount; the balance is untouched.
    pub fn debit(&mut self, amount: Cents) -> Result<()> {
        if amount < 0 {
            return Err(Error::InvalidAmount { amount });
        }
        self.balance -= amount;
        Ok(())
    }
}

/// Orderings offered for person listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonSort {
    /// Alphabetical, ties broken by balance
    Name,
    /// Lowest balance first, ties broken by name
    #[default]
    Balance,
    /// By the manual `position` key
    Manual,
}

impl PersonSort {
    /// Compares two people under this ordering.
    #[must_use]
    pub fn compare(self, a: &Person, b: &Person) -> Ordering {
        match self {
            Self::Name => a
                .name
                .cmp(&b.name)
                .then_with(|| a.balance.cmp(&b.balance)),
            Self::Balance => a
                .balance
                .cmp(&b.balance)
                .then_with(|| a.name.cmp(&b.name)),
            Self::Manual => a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)),
        }
    }
}
