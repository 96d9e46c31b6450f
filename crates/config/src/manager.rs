//! Configuration manager - main API for state and catalog files

use crate::catalog::MilestoneCatalog;
use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// State file name inside the config directory
pub const STATE_FILE: &str = "state.toml";

/// Milestone catalog file name inside the config directory
pub const CATALOG_FILE: &str = "milestones.toml";

/// Owns the config directory and the files inside it
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager over the platform config directory
    ///
    /// - Linux: `~/.config/ris/`
    /// - macOS: `~/Library/Application Support/ris/`
    /// - Windows: `%APPDATA%\ris\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Self::with_directory(config_dir)
    }

    /// Creates a manager over a custom config directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let persistence = ConfigPersistence::new(config_dir.join(STATE_FILE));

        Ok(Self {
            persistence,
            config_dir,
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "ris")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: "Could not determine user config directory".to_string(),
            })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Full path of the state file
    pub fn config_path(&self) -> &Path {
        self.persistence.path()
    }

    /// Full path of the milestone catalog
    pub fn catalog_path(&self) -> PathBuf {
        self.config_dir.join(CATALOG_FILE)
    }

    /// Loads the state file; a missing file is the default state
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the state, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load state: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Validates and atomically saves the state
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads, applies `update_fn` and saves
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Overwrites the state file with defaults
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Loads the milestone catalog next to the state file
    pub fn load_catalog(&self) -> ConfigResult<MilestoneCatalog> {
        MilestoneCatalog::load(&self.catalog_path())
    }

    /// Loads the state and applies `RIS_SECTION_FIELD` environment overrides
    ///
    /// Recognised: `RIS_SERVER_HOST`, `RIS_SERVER_PORT`, `RIS_APP_LOG_LEVEL`.
    /// Unparsable values are logged and ignored.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        self.apply_env(&mut config);

        if let Err(errors) = config.validate() {
            log::warn!(
                "State validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }

    /// Applies the environment overrides to an already loaded state
    ///
    /// Callers that save `config` afterwards persist the overridden values.
    pub fn apply_env(&self, config: &mut Config) {
        apply_env_overrides(config, |key| std::env::var(key).ok());
    }
}

fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("RIS_SERVER_HOST") {
        config.server.host = host;
    }

    if let Some(port) = lookup("RIS_SERVER_PORT") {
        match port.parse::<u16>() {
            Ok(p) => config.server.port = p,
            Err(_) => log::warn!("Ignoring RIS_SERVER_PORT={}: not a port number", port),
        }
    }

    if let Some(level) = lookup("RIS_APP_LOG_LEVEL") {
        match level.parse::<LogLevel>() {
            Ok(l) => config.app.log_level = l,
            Err(e) => log::warn!("Ignoring RIS_APP_LOG_LEVEL: {}", e),
        }
    }
}
