//! Race server connection and joined-game section

use crate::validation::{ConfigSection, ValidationError, Validator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default race server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default race server port
pub const DEFAULT_PORT: u16 = 8080;

/// Where the server is and which game we are playing in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host name or address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    /// Joined game id, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<String>,

    /// Our player name in the joined game, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,

    /// When the last sync with this server finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
}

impl ServerConfig {
    /// Returns the joined game and player when both are present
    pub fn joined(&self) -> Option<(&str, &str)> {
        match (&self.game, &self.player) {
            (Some(game), Some(player)) => Some((game.as_str(), player.as_str())),
            _ => None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            game: None,
            player: None,
            last_sync: None,
        }
    }
}

impl ConfigSection for ServerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::not_empty(&self.host, "server.host"),
            Validator::in_range(self.port, 1, u16::MAX, "server.port"),
        ];

        if self.game.is_some() != self.player.is_some() {
            results.push(Err(ValidationError::new(
                "server.player",
                "game and player must be set together",
            )));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.host = other.host;
        self.port = other.port;
        self.game = other.game;
        self.player = other.player;
        self.last_sync = other.last_sync;
    }

    fn section_name(&self) -> &'static str {
        "server"
    }
}
