//! Client session: server address, joined game and last-known state

use chrono::{DateTime, Utc};
use ris_config::ServerConfig;
use ris_core::{GameListing, GameState};
use ris_network::ServerAddress;

/// Game id and player name the client joined as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedGame {
    pub game_id: String,
    pub player: String,
}

/// What the client knows about the server
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub address: ServerAddress,
    pub joined: Option<JoinedGame>,
    /// Last game state fetched for the joined game
    pub game: Option<GameState>,
    /// Last game listing, if ever fetched
    pub listing: Option<GameListing>,
    /// Wall-clock time of the last completed sync, persisted with the server
    pub last_sync: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(address: ServerAddress) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    /// Restores the persisted part of a session
    pub fn from_config(config: &ServerConfig) -> Self {
        let joined = config.joined().map(|(game, player)| JoinedGame {
            game_id: game.to_string(),
            player: player.to_string(),
        });
        Self {
            address: ServerAddress::new(config.host.clone(), config.port),
            joined,
            last_sync: config.last_sync,
            ..Self::default()
        }
    }

    /// Writes the persisted part of the session into `config`
    pub fn write_config(&self, config: &mut ServerConfig) {
        config.host = self.address.host.clone();
        config.port = self.address.port;
        config.game = self.joined.as_ref().map(|j| j.game_id.clone());
        config.player = self.joined.as_ref().map(|j| j.player.clone());
        config.last_sync = self.last_sync;
    }

    pub fn is_joined(&self) -> bool {
        self.joined.is_some()
    }

    /// Drops everything tied to the joined game
    pub fn clear_joined(&mut self) {
        self.joined = None;
        self.game = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ris_core::YDate;

    #[test]
    fn test_default_session() {
        let session = Session::default();
        assert_eq!(session.address.to_string(), "127.0.0.1:8080");
        assert!(!session.is_joined());
        assert!(session.listing.is_none());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = ServerConfig {
            host: "race.example".to_string(),
            port: 9000,
            game: Some("g1".to_string()),
            player: Some("bob".to_string()),
            last_sync: Some(Utc::now()),
        };

        let session = Session::from_config(&config);
        assert_eq!(session.last_sync, config.last_sync);
        assert_eq!(
            session.joined,
            Some(JoinedGame {
                game_id: "g1".to_string(),
                player: "bob".to_string(),
            })
        );

        let mut written = ServerConfig::default();
        session.write_config(&mut written);
        assert_eq!(written, config);
    }

    #[test]
    fn test_half_joined_config_is_not_joined() {
        let config = ServerConfig {
            game: Some("g1".to_string()),
            ..ServerConfig::default()
        };
        assert!(!Session::from_config(&config).is_joined());
    }

    #[test]
    fn test_clear_joined_keeps_listing() {
        let mut session = Session::default();
        session.joined = Some(JoinedGame {
            game_id: "g1".to_string(),
            player: "bob".to_string(),
        });
        session.game = Some(GameState {
            min_date: YDate::new(1, 1),
            players: Default::default(),
        });
        session.listing = Some(GameListing::new());

        session.clear_joined();
        assert!(!session.is_joined());
        assert!(session.game.is_none());
        assert!(session.listing.is_some());
    }
}
