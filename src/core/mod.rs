//! Core business logic - the bill-splitting and balance-ledger engine.
//!
//! Everything here is synchronous, in-memory arithmetic with no I/O. The
//! persistence layer and the [`crate::tracker`] service drive it.

/// Saved events in display order and event id allocation
pub mod collection;
/// Events: subtotal, tip and total reconciliation, payer, participations
pub mod event;
/// The arena of people, postings, replay and audit
pub mod ledger;
/// Integer-cent helpers and rounding
pub mod money;
/// Participation records and base shares
pub mod participation;
/// Person records and sort orders
pub mod person;
/// Balance report data
pub mod report;
/// Per-person share computation
pub mod splitter;

pub use collection::EventCollection;
pub use event::Event;
pub use ledger::{BalanceDrift, Ledger};
pub use money::Cents;
pub use participation::Participation;
pub use person::{Person, PersonSort};
pub use report::BalanceReport;
pub use splitter::SplitOutcome;
