//! State file migrations
//!
//! Migrations run on the raw TOML tree before it is deserialized, so an old
//! layout never has to fit the current structs. When `CONFIG_VERSION` is
//! incremented, register the step in [`get_migration`].

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use ris_core::ResultVerdict;
use toml::Value;

/// One upgrade step
pub trait Migration {
    /// Version this step upgrades to
    fn target_version(&self) -> u32;

    fn migrate(&self, value: &mut Value) -> ConfigResult<()>;
}

/// Version recorded in a raw state tree; unversioned files are version 0
pub fn version_of(value: &Value) -> u32 {
    value
        .get("version")
        .and_then(Value::as_integer)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

/// Upgrades a raw state tree to the latest version and deserializes it
pub fn migrate_to_latest(mut value: Value) -> ConfigResult<Config> {
    let mut current_version = version_of(&value);

    if current_version > CONFIG_VERSION {
        log::warn!(
            "State version {} is newer than supported version {}. Attempting to use as-is.",
            current_version,
            CONFIG_VERSION
        );
    }

    while current_version < CONFIG_VERSION {
        let next_version = current_version + 1;

        match get_migration(next_version) {
            Some(migration) => {
                migration.migrate(&mut value)?;
                log::info!("Applied migration to version {}", migration.target_version());
            }
            None => log::warn!(
                "No migration defined for version {}, skipping",
                next_version
            ),
        }

        current_version = next_version;
    }

    if version_of(&value) < CONFIG_VERSION {
        if let Some(table) = value.as_table_mut() {
            table.insert(
                "version".to_string(),
                Value::Integer(i64::from(CONFIG_VERSION)),
            );
        }
    }

    value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ValidationError(e.to_string()))
}

fn get_migration(version: u32) -> Option<Box<dyn Migration>> {
    match version {
        1 => Some(Box::new(MigrationV1)),
        _ => None,
    }
}

/// Unversioned files spelled verdicts out (`result = "not first"`)
struct MigrationV1;

impl Migration for MigrationV1 {
    fn target_version(&self) -> u32 {
        1
    }

    fn migrate(&self, value: &mut Value) -> ConfigResult<()> {
        let Some(milestones) = value
            .get_mut("milestones")
            .and_then(Value::as_table_mut)
        else {
            return Ok(());
        };

        for (id, record) in milestones.iter_mut() {
            let Some(record) = record.as_table_mut() else {
                continue;
            };
            let Some(text) = record.get("result").and_then(Value::as_str) else {
                continue;
            };
            let verdict = parse_verdict(text).unwrap_or_else(|| {
                log::warn!("Milestone {}: unrecognised result {:?}, resetting", id, text);
                ResultVerdict::Unknown
            });
            record.insert(
                "result".to_string(),
                Value::Integer(i64::from(verdict.as_index())),
            );
        }
        Ok(())
    }
}

fn parse_verdict(text: &str) -> Option<ResultVerdict> {
    match text.trim().to_ascii_lowercase().replace('_', " ").as_str() {
        "first" => Some(ResultVerdict::First),
        "was leader" => Some(ResultVerdict::WasLeader),
        "unknown" => Some(ResultVerdict::Unknown),
        "not first" => Some(ResultVerdict::NotFirst),
        _ => None,
    }
}
