//! Race Into Space persisted state and milestone catalog
//!
//! Two files live in the config directory:
//!
//! - `state.toml`: server address, the joined game and per-milestone progress.
//!   Rewritten after every session so a restart resumes where it left off.
//! - `milestones.toml`: the catalog of race milestones (read-only for the client).
//!
//! # Architecture
//!
//! - **Trait-based sections**: each section implements `ConfigSection`
//! - **Graceful degradation**: validation problems on load are logged, not fatal
//! - **Atomic writes**: the state file is never left half-written
//!
//! # Example
//!
//! ```rust,no_run
//! use ris_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load_or_default();
//! println!("Server: {}:{}", config.server.host, config.server.port);
//! ```

mod error;
mod manager;
mod migration;
mod persistence;
mod validation;

pub mod app_config;
pub mod catalog;
mod server_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{ConfigManager, CATALOG_FILE, STATE_FILE};
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use catalog::{MilestoneCatalog, MilestoneDefinition};
pub use server_config::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT};

use ris_core::{MilestoneRecord, ResultVerdict, DAYS_PER_YEAR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current state file format version for migrations
pub const CONFIG_VERSION: u32 = 1;

/// Root of the persisted state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// File format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Server address and joined game
    pub server: ServerConfig,

    /// Per-milestone progress, keyed by milestone id
    pub milestones: BTreeMap<String, MilestoneRecord>,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.server.validate() {
            errors.append(&mut e);
        }

        for (id, record) in &self.milestones {
            errors.extend(validate_record(id, record));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.server.merge(other.server);
        self.milestones = other.milestones;
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            server: ServerConfig::default(),
            milestones: BTreeMap::new(),
        }
    }
}

fn validate_record(id: &str, record: &MilestoneRecord) -> Vec<ValidationError> {
    let mut results = Vec::new();

    if let Some(year) = record.year {
        results.push(Validator::in_range(year, 1, u32::MAX, &format!("milestones.{id}.year")));
    }
    if let Some(day) = record.day {
        results.push(Validator::in_range(day, 1, DAYS_PER_YEAR, &format!("milestones.{id}.day")));
    }
    if ResultVerdict::from_index(record.result).is_none() {
        results.push(Err(ValidationError::with_value(
            format!("milestones.{id}.result"),
            "must be between 0 and 3",
            record.result,
        )));
    }

    results.into_iter().filter_map(|r| r.err()).collect()
}
