//! Race milestones and their persisted state

use crate::error::{CoreError, CoreResult};
use crate::types::{ResultVerdict, YDate, DAYS_PER_YEAR};
use serde::{Deserialize, Serialize};

/// What satisfies a milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MilestoneSource {
    /// Exactly one underlying achievement
    Single(String),
    /// Any of several equivalent achievements, checked in declared order
    Group(Vec<String>),
}

impl MilestoneSource {
    /// Returns true for the group variant
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// The achievement identifiers, in declared order
    pub fn source_ids(&self) -> &[String] {
        match self {
            Self::Single(id) => std::slice::from_ref(id),
            Self::Group(ids) => ids,
        }
    }
}

/// A trackable race achievement and its synchronization status
///
/// Invariants: `reported` implies `completed_on` is set, and a terminal
/// verdict implies `completed_on` is set. `completed_on` is only cleared by
/// [`Milestone::reset`].
#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    id: String,
    reward: f64,
    tier: u32,
    source: MilestoneSource,
    completed_on: Option<YDate>,
    reported: bool,
    verdict: ResultVerdict,
}

impl Milestone {
    /// Creates an incomplete milestone tied to one achievement
    pub fn single(id: impl Into<String>, reward: f64, tier: u32, source: impl Into<String>) -> Self {
        Self::with_source(id, reward, tier, MilestoneSource::Single(source.into()))
    }

    /// Creates an incomplete milestone satisfied by any of `sources`
    pub fn group<I, S>(id: impl Into<String>, reward: f64, tier: u32, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources = sources.into_iter().map(Into::into).collect();
        Self::with_source(id, reward, tier, MilestoneSource::Group(sources))
    }

    /// Creates an incomplete milestone from an explicit source
    pub fn with_source(id: impl Into<String>, reward: f64, tier: u32, source: MilestoneSource) -> Self {
        Self {
            id: id.into(),
            reward,
            tier,
            source,
            completed_on: None,
            reported: false,
            verdict: ResultVerdict::Unknown,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn reward(&self) -> f64 {
        self.reward
    }

    pub fn tier(&self) -> u32 {
        self.tier
    }

    pub fn source(&self) -> &MilestoneSource {
        &self.source
    }

    pub fn completed_on(&self) -> Option<YDate> {
        self.completed_on
    }

    pub fn is_reported(&self) -> bool {
        self.reported
    }

    pub fn verdict(&self) -> ResultVerdict {
        self.verdict
    }

    pub fn is_completed(&self) -> bool {
        self.completed_on.is_some()
    }

    /// Completed locally but the server has not acknowledged it yet
    pub fn needs_report(&self) -> bool {
        self.completed_on.is_some() && !self.reported
    }

    /// Completed locally and still waiting on a verdict
    pub fn needs_resolution(&self) -> bool {
        self.completed_on.is_some() && self.verdict == ResultVerdict::Unknown
    }

    /// Stamps the completion date; returns false if it was already set
    pub fn mark_completed(&mut self, date: YDate) -> bool {
        if self.completed_on.is_some() {
            return false;
        }
        self.completed_on = Some(date);
        true
    }

    /// Records that the server acknowledged the completion
    pub fn mark_reported(&mut self) -> CoreResult<()> {
        if self.completed_on.is_none() {
            return Err(CoreError::NotCompleted(self.id.clone()));
        }
        self.reported = true;
        Ok(())
    }

    /// Applies a verdict from the server
    ///
    /// `Unknown` never overwrites what is stored. Returns true only when the
    /// milestone moves from undecided to `First`, which is the one moment a
    /// reward is due.
    pub fn apply_verdict(&mut self, verdict: ResultVerdict) -> CoreResult<bool> {
        if verdict == ResultVerdict::Unknown {
            return Ok(false);
        }
        if self.completed_on.is_none() {
            return Err(CoreError::NotCompleted(self.id.clone()));
        }
        let newly_first = verdict == ResultVerdict::First && self.verdict == ResultVerdict::Unknown;
        self.verdict = verdict;
        Ok(newly_first)
    }

    /// Returns the milestone to its initial incomplete state
    pub fn reset(&mut self) {
        self.completed_on = None;
        self.reported = false;
        self.verdict = ResultVerdict::Unknown;
    }

    /// Snapshot of the mutable state for persistence
    pub fn to_record(&self) -> MilestoneRecord {
        MilestoneRecord {
            year: self.completed_on.map(|d| d.year),
            day: self.completed_on.map(|d| d.day),
            reported: self.reported,
            result: self.verdict.as_index(),
        }
    }

    /// Restores the mutable state from a persisted record
    ///
    /// A record without a full date restores an incomplete milestone; the
    /// invariants are re-established rather than trusted. A date outside the
    /// game calendar or an unknown verdict is an error and leaves the
    /// milestone reset.
    pub fn restore(&mut self, record: &MilestoneRecord) -> CoreResult<()> {
        self.reset();
        let Some(date) = record.completion_date() else {
            return Ok(());
        };
        if date.year < 1 || !(1..=DAYS_PER_YEAR).contains(&date.day) {
            return Err(CoreError::InvalidDate {
                year: date.year,
                day: date.day,
            });
        }
        let verdict = ResultVerdict::from_index(record.result)
            .ok_or(CoreError::InvalidVerdict(record.result))?;
        self.completed_on = Some(date);
        self.reported = record.reported;
        self.verdict = verdict;
        Ok(())
    }
}

/// Persisted per-milestone state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(default)]
    pub reported: bool,
    /// Verdict as its integer form
    #[serde(default = "unknown_index")]
    pub result: u8,
}

fn unknown_index() -> u8 {
    ResultVerdict::Unknown.as_index()
}

impl MilestoneRecord {
    /// The completion date, if both halves were persisted
    pub fn completion_date(&self) -> Option<YDate> {
        match (self.year, self.day) {
            (Some(year), Some(day)) => Some(YDate::new(year, day)),
            _ => None,
        }
    }
}
