//! Host collaborators for the command line: achievements file and rewards

use anyhow::{Context, Result};
use console::style;
use ris_core::YDate;
use ris_sync_engine::RewardSink;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Default achievements file name inside the config directory
pub const ACHIEVEMENTS_FILE: &str = "achievements.toml";

/// Reads completed achievements from a TOML file
///
/// Each key is an achievement source id mapped to the elapsed game seconds
/// of its completions; the earliest one counts.
///
/// ```toml
/// "satellite" = [1234567.0]
/// "mun.probe" = [98000000.0, 91000000.0]
/// ```
///
/// A missing file means nothing is complete yet.
pub fn load_achievements(path: &Path) -> Result<BTreeMap<String, YDate>> {
    if !path.exists() {
        log::warn!("No achievements file at {}", path.display());
        return Ok(BTreeMap::new());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let raw: BTreeMap<String, Vec<f64>> = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(raw
        .into_iter()
        .filter_map(|(id, times)| {
            let earliest = times
                .into_iter()
                .filter(|t| t.is_finite())
                .min_by(f64::total_cmp)?;
            Some((id, YDate::from_universal_time(earliest)))
        })
        .collect())
}

/// Announces rewards on the terminal
pub struct ConsoleRewards;

impl RewardSink for ConsoleRewards {
    fn grant_reward(&self, amount: f64, milestone: &str) {
        println!(
            "{} Awarded {} funds for being first to complete {}",
            style("★").yellow().bold(),
            style(amount).bold(),
            style(milestone).cyan()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let loaded = load_achievements(&dir.path().join(ACHIEVEMENTS_FILE)).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_earliest_completion_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(ACHIEVEMENTS_FILE);
        fs::write(
            &path,
            "satellite = [0.0]\n\"mun.probe\" = [63072000.0, 34560000.0]\nnever = []\n",
        )
        .unwrap();

        let loaded = load_achievements(&path).unwrap();
        assert_eq!(loaded.get("satellite"), Some(&YDate::new(1, 1)));
        assert_eq!(loaded.get("mun.probe"), Some(&YDate::new(2, 36)));
        assert!(!loaded.contains_key("never"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(ACHIEVEMENTS_FILE);
        fs::write(&path, "satellite = \"yesterday\"").unwrap();
        assert!(load_achievements(&path).is_err());
    }
}
