//! Collaborators the host application provides

use ris_core::YDate;
use std::collections::{BTreeMap, HashMap};

/// Tells whether an underlying achievement has been completed
pub trait AchievementSource: Send + Sync {
    /// Date of the earliest completion, or `None` while incomplete
    fn completion_date(&self, source_id: &str) -> Option<YDate>;
}

/// Pays out the reward for being first
pub trait RewardSink: Send + Sync {
    fn grant_reward(&self, amount: f64, milestone: &str);
}

/// Current in-game date and crew losses
pub trait GameClock: Send + Sync {
    fn current_date(&self) -> YDate;

    /// Crew killed in action so far, sent with every heartbeat
    fn dead_crew_count(&self) -> u32;
}

impl AchievementSource for BTreeMap<String, YDate> {
    fn completion_date(&self, source_id: &str) -> Option<YDate> {
        self.get(source_id).copied()
    }
}

impl AchievementSource for HashMap<String, YDate> {
    fn completion_date(&self, source_id: &str) -> Option<YDate> {
        self.get(source_id).copied()
    }
}

/// A clock stopped at one moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    pub date: YDate,
    pub dead_crew: u32,
}

impl FixedClock {
    pub fn new(date: YDate, dead_crew: u32) -> Self {
        Self { date, dead_crew }
    }

    /// Clock at `seconds` of elapsed game time
    pub fn at_universal_time(seconds: f64, dead_crew: u32) -> Self {
        Self::new(YDate::from_universal_time(seconds), dead_crew)
    }
}

impl GameClock for FixedClock {
    fn current_date(&self) -> YDate {
        self.date
    }

    fn dead_crew_count(&self) -> u32 {
        self.dead_crew
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_source() {
        let mut source = BTreeMap::new();
        source.insert("orbit".to_string(), YDate::new(2, 10));
        assert_eq!(source.completion_date("orbit"), Some(YDate::new(2, 10)));
        assert_eq!(source.completion_date("mun"), None);
    }

    #[test]
    fn test_fixed_clock_from_elapsed_seconds() {
        let clock = FixedClock::at_universal_time(86_400.0 * 365.0, 3);
        assert_eq!(clock.current_date(), YDate::new(2, 1));
        assert_eq!(clock.dead_crew_count(), 3);
    }
}
