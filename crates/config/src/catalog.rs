//! Milestone catalog: which race milestones exist and what satisfies them
//!
//! ```toml
//! [[milestone]]
//! id = "FirstSatellite"
//! reward = 25000.0
//! tier = 1
//! source = "RIS_FirstSatellite"
//!
//! [[milestone]]
//! id = "MunLanding"
//! reward = 80000.0
//! tier = 3
//! sources = ["RIS_MunLandingCrewed", "RIS_MunLandingProbe"]
//! ```

use crate::error::{ConfigError, ConfigResult, ValidationError};
use crate::validation::Validator;
use ris_core::{Milestone, MilestoneSource};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One milestone as declared in the catalog file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MilestoneDefinition {
    /// Stable key, also the contract name sent to the server
    pub id: String,

    /// Funds granted for being first
    pub reward: f64,

    /// Difficulty tier reported alongside completions
    #[serde(default)]
    pub tier: u32,

    /// Single achievement source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Equivalent achievement sources, checked in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl MilestoneDefinition {
    fn validate(&self, field: &str) -> Vec<ValidationError> {
        let mut results = vec![Validator::not_empty(&self.id, &format!("{field}.id"))];

        if !self.reward.is_finite() || self.reward < 0.0 {
            results.push(Err(ValidationError::with_value(
                format!("{field}.reward"),
                "must be a non-negative number",
                self.reward,
            )));
        }

        match (&self.source, &self.sources) {
            (Some(source), None) => {
                results.push(Validator::not_empty(source, &format!("{field}.source")));
            }
            (None, Some(sources)) => {
                if sources.is_empty() {
                    results.push(Err(ValidationError::new(
                        format!("{field}.sources"),
                        "must list at least one source",
                    )));
                }
                for source in sources {
                    results.push(Validator::not_empty(source, &format!("{field}.sources")));
                }
            }
            _ => results.push(Err(ValidationError::new(
                field,
                "exactly one of `source` or `sources` is required",
            ))),
        }

        results.into_iter().filter_map(|r| r.err()).collect()
    }

    /// Builds the runtime milestone, in its initial state
    pub fn to_milestone(&self) -> Result<Milestone, Vec<ValidationError>> {
        let errors = self.validate(&format!("milestone.{}", self.id));
        let source = match (&self.source, &self.sources) {
            (Some(source), None) if errors.is_empty() => MilestoneSource::Single(source.clone()),
            (None, Some(sources)) if errors.is_empty() => MilestoneSource::Group(sources.clone()),
            _ => return Err(errors),
        };
        Ok(Milestone::with_source(
            self.id.clone(),
            self.reward,
            self.tier,
            source,
        ))
    }
}

/// All declared milestones, in file order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MilestoneCatalog {
    #[serde(default, rename = "milestone")]
    pub milestones: Vec<MilestoneDefinition>,
}

impl MilestoneCatalog {
    /// Validates every definition and the uniqueness of ids
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for (index, definition) in self.milestones.iter().enumerate() {
            let field = format!("milestone[{index}]");
            errors.extend(definition.validate(&field));
            if !seen.insert(definition.id.as_str()) {
                errors.push(ValidationError::with_value(
                    format!("{field}.id"),
                    "duplicate milestone id",
                    &definition.id,
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Builds the runtime milestones, rejecting an invalid catalog
    pub fn build(&self) -> ConfigResult<Vec<Milestone>> {
        self.validate().map_err(join_errors)?;
        self.milestones
            .iter()
            .map(|definition| definition.to_milestone().map_err(join_errors))
            .collect()
    }

    /// Loads a catalog file; a missing file yields an empty catalog
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            log::warn!(
                "Milestone catalog not found at {}, no milestones will be tracked",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let catalog: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        log::info!(
            "Loaded {} milestone definitions from {}",
            catalog.milestones.len(),
            path.display()
        );
        Ok(catalog)
    }
}

fn join_errors(errors: Vec<ValidationError>) -> ConfigError {
    ConfigError::ValidationError(
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; "),
    )
}
