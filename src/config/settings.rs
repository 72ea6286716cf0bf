//! Application settings loaded from `dinnerdebt.toml`.
//!
//! Every section is optional; a missing file means all defaults. The people
//! listed under `[[people.seed]]` are added on start-up if nobody by that name
//! exists yet.

use crate::{
    core::person::PersonSort,
    errors::{Error, Result},
};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_SETTINGS_PATH: &str = "dinnerdebt.toml";

/// Configuration structure representing the entire settings file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Defaults applied to new events
    pub events: EventSettings,
    /// Person listing and seeding
    pub people: PeopleSettings,
}

/// `[events]` section
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    /// Tip rate new events start with
    pub default_tip_percent: f64,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            default_tip_percent: 15.0,
        }
    }
}

/// `[people]` section
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PeopleSettings {
    /// Order used for balance listings
    pub sort: PersonSort,
    /// People to create on first run
    pub seed: Vec<SeedPerson>,
}

/// A person to seed
#[derive(Debug, Clone, Deserialize)]
pub struct SeedPerson {
    /// Display name
    pub name: String,
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or parsed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    debug!("Attempting to load settings from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads settings from `DINNERDEBT_CONFIG` or `./dinnerdebt.toml`, using the
/// defaults when that file does not exist.
///
/// # Errors
/// Returns [`Error::Config`] for a file that exists but is invalid.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var("DINNERDEBT_CONFIG").unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    if !Path::new(&path).exists() {
        info!("No settings file at {path}, using defaults");
        return Ok(Settings::default());
    }
    load_settings(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_settings() {
        let toml_str = r#"
            [events]
            default_tip_percent = 18.5

            [people]
            sort = "name"

            [[people.seed]]
            name = "Alice"

            [[people.seed]]
            name = "Bob"
        "#;

        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.events.default_tip_percent, 18.5);
        assert_eq!(settings.people.sort, PersonSort::Name);
        assert_eq!(settings.people.seed.len(), 2);
        assert_eq!(settings.people.seed[1].name, "Bob");
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.events.default_tip_percent, 15.0);
        assert_eq!(settings.people.sort, PersonSort::Balance);
        assert!(settings.people.seed.is_empty());
    }

    #[test]
    fn test_bad_sort_is_config_error() {
        let dir = std::env::temp_dir().join("dinner_debt_bad_settings.toml");
        std::fs::write(&dir, "[people]\nsort = \"height\"\n").unwrap();

        let result = load_settings(&dir);
        assert!(matches!(result, Err(Error::Config { .. })));
        std::fs::remove_file(&dir).ok();
    }
}
