//! Game listing and joined-game snapshots as served by the race server

use crate::types::YDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of the server's game listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Earliest synchronized date among the game's players
    #[serde(rename = "mindate")]
    pub min_date: YDate,
    /// Names of the players in the game
    pub players: Vec<String>,
}

impl GameSummary {
    /// Returns true if the named player is part of this game
    pub fn has_player(&self, name: &str) -> bool {
        self.players.iter().any(|p| p == name)
    }
}

/// The full listing: game id to summary
pub type GameListing = BTreeMap<String, GameSummary>;

/// A player's last synchronized date and pacing status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub date: YDate,
    #[serde(rename = "leader")]
    pub is_leader: bool,
}

/// Authoritative snapshot of the joined game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(rename = "mindate")]
    pub min_date: YDate,
    pub players: BTreeMap<String, PlayerRecord>,
}

impl GameState {
    /// Looks up a player's record
    pub fn player(&self, name: &str) -> Option<&PlayerRecord> {
        self.players.get(name)
    }

    /// Names of the players currently pacing the game
    pub fn leaders(&self) -> impl Iterator<Item = &str> {
        self.players
            .iter()
            .filter(|(_, record)| record.is_leader)
            .map(|(name, _)| name.as_str())
    }
}
