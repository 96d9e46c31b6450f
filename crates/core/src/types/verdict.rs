//! Race verdicts and the per-player result documents that carry them

use crate::types::YDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The server's ruling on who reached a milestone first
///
/// Only `Unknown` is non-terminal. The discriminants are the persisted
/// integer form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultVerdict {
    First = 0,
    #[serde(alias = "was leader")]
    WasLeader = 1,
    #[default]
    Unknown = 2,
    #[serde(alias = "not first")]
    NotFirst = 3,
}

impl ResultVerdict {
    /// Returns the persisted integer form
    pub fn as_index(self) -> u8 {
        self as u8
    }

    /// Parses the persisted integer form
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::First),
            1 => Some(Self::WasLeader),
            2 => Some(Self::Unknown),
            3 => Some(Self::NotFirst),
            _ => None,
        }
    }

    /// Returns true once the server has decided
    pub fn is_terminal(self) -> bool {
        self != Self::Unknown
    }
}

impl fmt::Display for ResultVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::WasLeader => write!(f, "was leader"),
            Self::Unknown => write!(f, "unknown"),
            Self::NotFirst => write!(f, "not first"),
        }
    }
}

/// One player's entry in a result document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResult {
    /// Date the server recorded for the player's completion
    pub date: YDate,
    #[serde(rename = "first")]
    pub verdict: ResultVerdict,
}

/// Response of `/completed` and `/result`: player name to result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultReport(BTreeMap<String, PlayerResult>);

impl ResultReport {
    /// Creates a report from its entries
    pub fn new(entries: BTreeMap<String, PlayerResult>) -> Self {
        Self(entries)
    }

    /// The entry for the named player, if the server mentioned them
    pub fn for_player(&self, name: &str) -> Option<&PlayerResult> {
        self.0.get(name)
    }

    /// Number of players the server reported on
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no player has completed the milestone yet
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip_matches_declared_order() {
        assert_eq!(ResultVerdict::First.as_index(), 0);
        assert_eq!(ResultVerdict::WasLeader.as_index(), 1);
        assert_eq!(ResultVerdict::Unknown.as_index(), 2);
        assert_eq!(ResultVerdict::NotFirst.as_index(), 3);
        assert_eq!(ResultVerdict::from_index(3), Some(ResultVerdict::NotFirst));
        assert_eq!(ResultVerdict::from_index(4), None);
    }

    #[test]
    fn test_only_unknown_is_open() {
        assert!(!ResultVerdict::Unknown.is_terminal());
        assert!(ResultVerdict::First.is_terminal());
        assert!(ResultVerdict::WasLeader.is_terminal());
        assert!(ResultVerdict::NotFirst.is_terminal());
    }

    #[test]
    fn test_decode_spellings() {
        let first: ResultVerdict = serde_json::from_str(r#""first""#).unwrap();
        let leader: ResultVerdict = serde_json::from_str(r#""was_leader""#).unwrap();
        let spaced: ResultVerdict = serde_json::from_str(r#""not first""#).unwrap();
        assert_eq!(first, ResultVerdict::First);
        assert_eq!(leader, ResultVerdict::WasLeader);
        assert_eq!(spaced, ResultVerdict::NotFirst);
    }

    #[test]
    fn test_decode_rejects_unrecognised_verdict() {
        let result: Result<ResultVerdict, _> = serde_json::from_str(r#""second""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_report_lookup() {
        let report: ResultReport = serde_json::from_str(
            r#"{"alice":{"date":{"year":1,"day":3},"first":"first"},
                "bob":{"date":{"year":1,"day":4},"first":"unknown"}}"#,
        )
        .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(
            report.for_player("alice").map(|r| r.verdict),
            Some(ResultVerdict::First)
        );
        assert_eq!(report.for_player("bob").unwrap().date, YDate::new(1, 4));
        assert!(report.for_player("carol").is_none());
    }
}
