//! Versioned snapshot documents and their migration pipeline.
//!
//! A snapshot is a JSON document carrying a numeric `version` field. Each
//! version has its own plain data structs; upgrading is a pure function from
//! one version to the next, and [`migrate`] chains them up to the current one.
//!
//! - Version 1 is the legacy depot export: people keyed by id holding only a
//!   name and a balance, and events without payer or participations. Subtotals
//!   and totals may be fractional there.
//! - Version 2 is the current layout.

use crate::{
    core::{
        event::Event,
        money::{Cents, round_half_up},
        participation::Participation,
        person::Person,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Version written by [`Snapshot::to_json`].
pub const CURRENT_VERSION: u32 = 2;

/// Legacy depot layout.
pub mod v1 {
    use super::{BTreeMap, DateTime, Deserialize, Serialize, Utc};

    /// A person as the depot stored it
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Person {
        /// Display name
        pub name: String,
        /// Balance in cents
        pub balance: i64,
    }

    /// An event as the depot stored it
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Event {
        /// Event id; duplicates and zero occur in old exports
        #[serde(default)]
        pub id: i64,
        /// Description
        #[serde(default)]
        pub description: String,
        /// Subtotal in cents, possibly fractional
        #[serde(default)]
        pub subtotal: f64,
        /// Tip percentage
        #[serde(default)]
        pub tip_percent: f64,
        /// Total in cents, possibly fractional
        #[serde(default)]
        pub total: f64,
        /// When the event happened
        pub date: DateTime<Utc>,
    }

    /// Whole version 1 document
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Document {
        /// People keyed by their id, as a string
        #[serde(default)]
        pub people: BTreeMap<String, Person>,
        /// Events, newest first
        #[serde(default)]
        pub ddevents: Vec<Event>,
    }
}

/// Current layout.
pub mod v2 {
    use super::{DateTime, Deserialize, Serialize, Utc};

    /// A saved person
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Person {
        /// Person id
        pub id: i64,
        /// Display name
        pub name: String,
        /// Balance in cents
        pub balance: i64,
        /// Manual ordering key
        pub position: i64,
    }

    /// One participation of an event
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Participation {
        /// Participant
        pub person_id: i64,
        /// Whether the person shares the expense
        pub is_sharing: bool,
        /// Whether the share is fixed
        pub share_is_fixed: bool,
        /// Pre-tip amount attributed to the person
        pub additional_amount: i64,
        /// Computed share
        pub total: i64,
    }

    /// A saved event
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Event {
        /// Event id
        pub id: i64,
        /// Description
        pub description: String,
        /// Subtotal in cents
        pub subtotal: i64,
        /// Tip percentage
        pub tip_percent: f64,
        /// Total in cents
        pub total: i64,
        /// When the event happened
        pub date: DateTime<Utc>,
        /// Person who paid
        pub payer_id: Option<i64>,
        /// Participations in reference order
        #[serde(default)]
        pub participations: Vec<Participation>,
    }

    /// Whole version 2 document
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Document {
        /// All people
        pub people: Vec<Person>,
        /// All events
        pub events: Vec<Event>,
    }
}

/// A parsed snapshot of any supported version.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// Legacy depot export
    V1(v1::Document),
    /// Current layout
    V2(v2::Document),
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

impl Snapshot {
    /// Parses a JSON snapshot, dispatching on its `version` field.
    ///
    /// # Errors
    /// [`Error::Snapshot`] for malformed JSON or an unknown version.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let VersionProbe { version } = serde_json::from_value(value.clone())?;
        debug!(version, "Parsing snapshot");
        match version {
            1 => Ok(Self::V1(serde_json::from_value(value)?)),
            2 => Ok(Self::V2(serde_json::from_value(value)?)),
            other => Err(Error::Snapshot {
                message: format!("Unsupported snapshot version {other}"),
            }),
        }
    }

    /// Writes the snapshot as JSON, upgrading it to the current version first.
    ///
    /// # Errors
    /// [`Error::Snapshot`] if the upgrade or serialization fails.
    pub fn to_json(self) -> Result<String> {
        let document = migrate(self)?;
        let mut value = serde_json::to_value(document)?;
        if let serde_json::Value::Object(map) = &mut value {
            map.insert("version".to_string(), CURRENT_VERSION.into());
        }
        Ok(serde_json::to_string_pretty(&value)?)
    }
}

/// Upgrades a version 1 document.
///
/// People keep their ids and are positioned in id order. Fractional amounts
/// are rounded to cents. Events with a zero or repeated id get fresh ids past
/// the highest one in use.
///
/// # Errors
/// [`Error::Snapshot`] for a person key that is not a positive integer.
pub fn upgrade_v1(document: v1::Document) -> Result<v2::Document> {
    let mut people = Vec::with_capacity(document.people.len());
    for (key, person) in document.people {
        let id: i64 = key
            .parse()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| Error::Snapshot {
                message: format!("Invalid person id {key:?}"),
            })?;
        people.push(v2::Person {
            id,
            name: person.name,
            balance: person.balance,
            position: 0,
        });
    }
    people.sort_by_key(|person| person.id);
    for (person, position) in people.iter_mut().zip(1..) {
        person.position = position;
    }

    let mut next_id = document
        .ddevents
        .iter()
        .map(|event| event.id)
        .max()
        .unwrap_or_default()
        .max(0)
        + 1;
    let mut seen = BTreeSet::new();
    let events = document
        .ddevents
        .into_iter()
        .map(|event| {
            let id = if event.id > 0 && seen.insert(event.id) {
                event.id
            } else {
                warn!(old = event.id, new = next_id, "Renumbering legacy event");
                next_id += 1;
                next_id - 1
            };
            v2::Event {
                id,
                description: event.description,
                subtotal: round_half_up(event.subtotal),
                tip_percent: event.tip_percent,
                total: round_half_up(event.total),
                date: event.date,
                payer_id: None,
                participations: Vec::new(),
            }
        })
        .collect();

    Ok(v2::Document { people, events })
}

/// Brings any snapshot up to the current version.
///
/// # Errors
/// See [`upgrade_v1`].
pub fn migrate(snapshot: Snapshot) -> Result<v2::Document> {
    match snapshot {
        Snapshot::V1(document) => upgrade_v1(document),
        Snapshot::V2(document) => Ok(document),
    }
}

impl v2::Document {
    /// Builds a document from engine state.
    #[must_use]
    pub fn capture<'a>(
        people: impl IntoIterator<Item = &'a Person>,
        events: impl IntoIterator<Item = &'a Event>,
    ) -> Self {
        Self {
            people: people
                .into_iter()
                .map(|person| v2::Person {
                    id: person.id,
                    name: person.name.clone(),
                    balance: person.balance,
                    position: person.position,
                })
                .collect(),
            events: events
                .into_iter()
                .map(|event| v2::Event {
                    id: event.id(),
                    description: event.description.clone(),
                    subtotal: event.subtotal(),
                    tip_percent: event.tip_percent(),
                    total: event.total(),
                    date: event.date,
                    payer_id: event.payer_id(),
                    participations: event
                        .kept_participations()
                        .map(|part| v2::Participation {
                            person_id: part.person_id,
                            is_sharing: part.is_sharing,
                            share_is_fixed: part.share_is_fixed,
                            additional_amount: part.additional_amount,
                            total: part.total(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Converts the document into engine records.
    ///
    /// # Errors
    /// [`Error::Snapshot`] for repeated ids or a reference to an unknown person.
    pub fn into_records(self) -> Result<(Vec<Person>, Vec<Event>)> {
        let mut person_ids = BTreeSet::new();
        let people: Vec<Person> = self
            .people
            .into_iter()
            .map(|person| {
                if person.id <= 0 || !person_ids.insert(person.id) {
                    return Err(Error::Snapshot {
                        message: format!("Invalid or repeated person id {}", person.id),
                    });
                }
                Ok(Person {
                    id: person.id,
                    name: person.name,
                    balance: person.balance,
                    position: person.position,
                })
            })
            .collect::<Result<_>>()?;

        let known = |id: i64| {
            if person_ids.contains(&id) {
                Ok(id)
            } else {
                Err(Error::Snapshot {
                    message: format!("Unknown person id {id}"),
                })
            }
        };

        let mut event_ids = BTreeSet::new();
        let mut events = Vec::with_capacity(self.events.len());
        for event in self.events {
            if event.id <= 0 || !event_ids.insert(event.id) {
                return Err(Error::Snapshot {
                    message: format!("Invalid or repeated event id {}", event.id),
                });
            }
            let payer_id = event.payer_id.map(known).transpose()?;
            let participations = event
                .participations
                .into_iter()
                .map(|part| {
                    Ok(Participation::restore(
                        event.id,
                        known(part.person_id)?,
                        part.is_sharing,
                        part.share_is_fixed,
                        part.additional_amount,
                        part.total,
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            events.push(Event::restore(
                event.id,
                event.description,
                event.subtotal,
                event.tip_percent,
                event.total,
                event.date,
                payer_id,
                participations,
            ));
        }

        Ok((people, events))
    }
}

/// Sum of all balances in a document, for import logging.
#[must_use]
pub fn net_balance(document: &v2::Document) -> Cents {
    document.people.iter().map(|person| person.balance).sum()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    const LEGACY: &str = r#"{
        "version": 1,
        "people": {
            "2": { "name": "Bob", "balance": -500 },
            "1": { "name": "Steve", "balance": 500 }
        },
        "ddevents": [
            { "id": 1, "description": "test event 1", "subtotal": 9512, "tipPercent": 5,
              "total": 9988, "date": "2009-05-06T00:00:00Z" },
            { "id": 1, "description": "test event 2", "subtotal": 869.5652, "tipPercent": 15,
              "total": 1000, "date": "2009-05-07T00:00:00Z" }
        ]
    }"#;

    #[test]
    fn test_parse_legacy_snapshot() {
        let snapshot = Snapshot::from_json(LEGACY).unwrap();
        let Snapshot::V1(document) = &snapshot else {
            panic!("expected version 1");
        };
        assert_eq!(document.people.len(), 2);
        assert_eq!(document.ddevents[1].tip_percent, 15.0);
    }

    #[test]
    fn test_upgrade_v1() {
        let document = migrate(Snapshot::from_json(LEGACY).unwrap()).unwrap();

        let names: Vec<(&str, i64)> = document
            .people
            .iter()
            .map(|p| (p.name.as_str(), p.position))
            .collect();
        assert_eq!(names, [("Steve", 1), ("Bob", 2)]);

        // The repeated id is renumbered; the fractional subtotal is rounded
        assert_eq!(document.events[0].id, 1);
        assert_eq!(document.events[1].id, 2);
        assert_eq!(document.events[1].subtotal, 870);
        assert_eq!(net_balance(&document), 0);
    }

    #[test]
    fn test_invalid_person_key() {
        let json = r#"{ "version": 1, "people": { "abc": { "name": "X", "balance": 0 } } }"#;
        let result = migrate(Snapshot::from_json(json).unwrap());
        assert!(matches!(result, Err(Error::Snapshot { .. })));
    }

    #[test]
    fn test_unknown_version() {
        let result = Snapshot::from_json(r#"{ "version": 9 }"#);
        assert!(matches!(result, Err(Error::Snapshot { .. })));
        let result = Snapshot::from_json("not json");
        assert!(matches!(result, Err(Error::Snapshot { .. })));
    }

    #[test]
    fn test_current_document_survives_json() {
        let document = migrate(Snapshot::from_json(LEGACY).unwrap()).unwrap();
        let json = Snapshot::V2(document.clone()).to_json().unwrap();

        assert_eq!(Snapshot::from_json(&json).unwrap(), Snapshot::V2(document));
    }

    #[test]
    fn test_into_records_rejects_unknown_person() {
        let mut document = migrate(Snapshot::from_json(LEGACY).unwrap()).unwrap();
        document.events[0].payer_id = Some(77);

        let result = document.into_records();
        assert!(matches!(result, Err(Error::Snapshot { .. })));
    }

    #[test]
    fn test_into_records() {
        let mut document = migrate(Snapshot::from_json(LEGACY).unwrap()).unwrap();
        document.events[0].payer_id = Some(1);
        document.events[0].participations.push(v2::Participation {
            person_id: 2,
            is_sharing: true,
            share_is_fixed: false,
            additional_amount: 0,
            total: 9988,
        });

        let (people, events) = document.into_records().unwrap();
        assert_eq!(people.len(), 2);
        assert_eq!(events[0].payer_id(), Some(1));
        assert_eq!(events[0].participation(2).unwrap().total(), 9988);
        assert_eq!(events[0].participation(2).unwrap().event_id, 1);
    }
}
