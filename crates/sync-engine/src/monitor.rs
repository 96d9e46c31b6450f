//! Milestone monitor: which milestones need reporting or resolving

use crate::ports::{AchievementSource, GameClock};
use ris_core::{Milestone, MilestoneRecord, MilestoneSource, YDate};
use std::collections::BTreeMap;

/// Owns every tracked milestone in a fixed order
///
/// Single-source milestones come first, then group milestones, each kind
/// keeping the order it was declared in.
#[derive(Debug, Clone, Default)]
pub struct MilestoneMonitor {
    milestones: Vec<Milestone>,
}

impl MilestoneMonitor {
    pub fn new(milestones: impl IntoIterator<Item = Milestone>) -> Self {
        let (mut ordered, groups): (Vec<_>, Vec<_>) = milestones
            .into_iter()
            .partition(|m| !m.source().is_group());
        ordered.extend(groups);
        Self {
            milestones: ordered,
        }
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn len(&self) -> usize {
        self.milestones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Milestone> {
        self.milestones.iter_mut().find(|m| m.id() == id)
    }

    /// Detects new completions and returns the first unreported one
    ///
    /// Every incomplete milestone is checked against `source`. A single-source
    /// milestone is stamped with the clock's date; a group takes the date of
    /// the first of its sources, in declared order, that is complete.
    pub fn check_all(
        &mut self,
        source: &dyn AchievementSource,
        clock: &dyn GameClock,
    ) -> Option<&Milestone> {
        for milestone in self.milestones.iter_mut().filter(|m| !m.is_completed()) {
            if let Some(date) = detect_completion(milestone.source(), source, clock) {
                milestone.mark_completed(date);
                log::info!("Milestone {} completed at {}", milestone.id(), date);
            }
        }
        self.milestones.iter().find(|m| m.needs_report())
    }

    /// Completed milestones still waiting on a verdict, in monitor order
    pub fn to_resolve(&self) -> Vec<&Milestone> {
        self.milestones
            .iter()
            .filter(|m| m.needs_resolution())
            .collect()
    }

    /// Persisted state of every completed milestone, keyed by id
    pub fn save(&self) -> BTreeMap<String, MilestoneRecord> {
        self.milestones
            .iter()
            .filter(|m| m.is_completed())
            .map(|m| (m.id().to_string(), m.to_record()))
            .collect()
    }

    /// Restores persisted state; milestones absent from `records` are reset
    pub fn load(&mut self, records: &BTreeMap<String, MilestoneRecord>) {
        for milestone in &mut self.milestones {
            match records.get(milestone.id()) {
                Some(record) => {
                    if let Err(e) = milestone.restore(record) {
                        log::warn!("Discarding saved state of {}: {}", milestone.id(), e);
                        milestone.reset();
                    }
                }
                None => milestone.reset(),
            }
        }

        for id in records.keys().filter(|id| self.get(id).is_none()) {
            log::debug!("Ignoring saved state of unknown milestone {}", id);
        }
    }
}

fn detect_completion(
    milestone_source: &MilestoneSource,
    source: &dyn AchievementSource,
    clock: &dyn GameClock,
) -> Option<YDate> {
    match milestone_source {
        MilestoneSource::Single(id) => source.completion_date(id).map(|_| clock.current_date()),
        MilestoneSource::Group(ids) => ids.iter().find_map(|id| source.completion_date(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use ris_core::ResultVerdict;

    fn monitor() -> MilestoneMonitor {
        MilestoneMonitor::new([
            Milestone::group("Mun", 80_000.0, 3, ["mun.crewed", "mun.probe"]),
            Milestone::single("Satellite", 25_000.0, 1, "satellite"),
            Milestone::single("Orbit", 40_000.0, 2, "orbit"),
        ])
    }

    fn clock() -> FixedClock {
        FixedClock::new(YDate::new(5, 100), 0)
    }

    fn source(entries: &[(&str, YDate)]) -> BTreeMap<String, YDate> {
        entries
            .iter()
            .map(|(id, date)| (id.to_string(), *date))
            .collect()
    }

    fn ids(monitor: &MilestoneMonitor) -> Vec<&str> {
        monitor.milestones().iter().map(|m| m.id()).collect()
    }

    #[test]
    fn test_singles_before_groups() {
        assert_eq!(ids(&monitor()), ["Satellite", "Orbit", "Mun"]);
    }

    #[test]
    fn test_nothing_complete() {
        let mut monitor = monitor();
        assert!(monitor.check_all(&source(&[]), &clock()).is_none());
        assert!(monitor.to_resolve().is_empty());
        assert!(monitor.save().is_empty());
    }

    #[test]
    fn test_single_is_stamped_with_clock_date() {
        let mut monitor = monitor();
        let next = monitor
            .check_all(&source(&[("orbit", YDate::new(1, 1))]), &clock())
            .map(|m| (m.id().to_string(), m.completed_on()));
        assert_eq!(next, Some(("Orbit".to_string(), Some(YDate::new(5, 100)))));
    }

    #[test]
    fn test_group_takes_first_complete_source_date() {
        let mut monitor = monitor();
        let achievements = source(&[("mun.probe", YDate::new(3, 40))]);
        let next = monitor.check_all(&achievements, &clock()).map(|m| m.id().to_string());

        assert_eq!(next.as_deref(), Some("Mun"));
        assert_eq!(
            monitor.get("Mun").and_then(|m| m.completed_on()),
            Some(YDate::new(3, 40))
        );
    }

    #[test]
    fn test_group_prefers_declared_order() {
        let mut monitor = monitor();
        let achievements = source(&[
            ("mun.crewed", YDate::new(4, 2)),
            ("mun.probe", YDate::new(3, 40)),
        ]);
        monitor.check_all(&achievements, &clock());
        assert_eq!(
            monitor.get("Mun").and_then(|m| m.completed_on()),
            Some(YDate::new(4, 2))
        );
    }

    #[test]
    fn test_check_all_skips_reported() {
        let mut monitor = monitor();
        let achievements = source(&[("satellite", YDate::new(1, 1)), ("orbit", YDate::new(1, 2))]);

        let first = monitor.check_all(&achievements, &clock()).map(|m| m.id().to_string());
        assert_eq!(first.as_deref(), Some("Satellite"));
        monitor.get_mut("Satellite").unwrap().mark_reported().unwrap();

        let second = monitor.check_all(&achievements, &clock()).map(|m| m.id().to_string());
        assert_eq!(second.as_deref(), Some("Orbit"));
        monitor.get_mut("Orbit").unwrap().mark_reported().unwrap();

        assert!(monitor.check_all(&achievements, &clock()).is_none());
    }

    #[test]
    fn test_completion_date_is_not_restamped() {
        let mut monitor = monitor();
        let achievements = source(&[("orbit", YDate::new(1, 1))]);
        monitor.check_all(&achievements, &FixedClock::new(YDate::new(2, 2), 0));
        monitor.check_all(&achievements, &FixedClock::new(YDate::new(9, 9), 0));
        assert_eq!(
            monitor.get("Orbit").and_then(|m| m.completed_on()),
            Some(YDate::new(2, 2))
        );
    }

    #[test]
    fn test_to_resolve_is_exactly_the_undecided_completed_subset() {
        let mut monitor = monitor();
        let achievements = source(&[
            ("satellite", YDate::new(1, 1)),
            ("orbit", YDate::new(1, 2)),
            ("mun.probe", YDate::new(1, 3)),
        ]);
        monitor.check_all(&achievements, &clock());
        monitor
            .get_mut("Orbit")
            .unwrap()
            .apply_verdict(ResultVerdict::NotFirst)
            .unwrap();

        let pending: Vec<&str> = monitor.to_resolve().iter().map(|m| m.id()).collect();
        assert_eq!(pending, ["Satellite", "Mun"]);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut monitor = monitor();
        monitor.check_all(&source(&[("satellite", YDate::new(1, 1))]), &clock());
        {
            let satellite = monitor.get_mut("Satellite").unwrap();
            satellite.mark_reported().unwrap();
            satellite.apply_verdict(ResultVerdict::First).unwrap();
        }

        let saved = monitor.save();
        assert_eq!(saved.keys().collect::<Vec<_>>(), ["Satellite"]);

        let mut restored = self::monitor();
        restored.load(&saved);
        assert_eq!(restored.get("Satellite"), monitor.get("Satellite"));
        assert!(!restored.get("Orbit").unwrap().is_completed());
    }

    #[test]
    fn test_load_resets_absent_and_invalid_entries() {
        let mut monitor = monitor();
        monitor.check_all(
            &source(&[("satellite", YDate::new(1, 1)), ("orbit", YDate::new(1, 1))]),
            &clock(),
        );

        let mut records = BTreeMap::new();
        records.insert(
            "Orbit".to_string(),
            MilestoneRecord {
                year: Some(1),
                day: Some(1),
                reported: true,
                result: 42,
            },
        );
        monitor.load(&records);

        assert!(!monitor.get("Satellite").unwrap().is_completed());
        assert!(!monitor.get("Orbit").unwrap().is_completed());
    }

    #[test]
    fn test_load_resets_dates_off_the_calendar() {
        let mut records = BTreeMap::new();
        records.insert(
            "Orbit".to_string(),
            MilestoneRecord {
                year: Some(1),
                day: Some(400),
                reported: true,
                result: 3,
            },
        );
        records.insert(
            "Satellite".to_string(),
            MilestoneRecord {
                year: Some(2),
                day: Some(365),
                reported: true,
                result: 0,
            },
        );

        let mut monitor = monitor();
        monitor.load(&records);

        assert!(!monitor.get("Orbit").unwrap().is_completed());
        assert_eq!(
            monitor.get("Satellite").and_then(|m| m.completed_on()),
            Some(YDate::new(2, 365))
        );

        let saved = monitor.save();
        assert_eq!(saved.keys().collect::<Vec<_>>(), ["Satellite"]);
    }
}
