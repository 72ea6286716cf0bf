/// Database connection and table creation
pub mod database;

/// Application settings loaded from dinnerdebt.toml
pub mod settings;

pub use settings::{Settings, load_default_settings, load_settings};
