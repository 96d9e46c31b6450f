//! Server address and the endpoints of the race protocol

use crate::error::{NetworkError, NetworkResult};
use reqwest::Url;
use ris_core::YDate;
use std::fmt;

/// Default server host (loopback)
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 8080;

/// Where the race server lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    /// Creates an address from host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Base URL of the server
    pub fn base_url(&self) -> NetworkResult<Url> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(NetworkError::InvalidUrl("empty host".to_string()));
        }
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_string()
        };
        let raw = format!("http://{}:{}/", host, self.port);
        Url::parse(&raw).map_err(|e| NetworkError::InvalidUrl(format!("{raw}: {e}")))
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One call of the race protocol with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `/` - list games
    ListGames,
    /// `/join` - join a game under a player name
    Join { game: String, name: String },
    /// `/part` - leave a game
    Part { game: String, name: String },
    /// `/game` - read a game's state
    ReadGame { game: String },
    /// `/sync` - heartbeat with the current date and crew losses
    Sync {
        game: String,
        player: String,
        date: YDate,
        kia: u32,
    },
    /// `/completed` - report a milestone completion
    Completed {
        game: String,
        player: String,
        date: YDate,
        contract: String,
        tier: u32,
    },
    /// `/result` - ask for a milestone's verdicts
    Result { game: String, contract: String },
}

impl Endpoint {
    /// Request path
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::ListGames => "/",
            Endpoint::Join { .. } => "/join",
            Endpoint::Part { .. } => "/part",
            Endpoint::ReadGame { .. } => "/game",
            Endpoint::Sync { .. } => "/sync",
            Endpoint::Completed { .. } => "/completed",
            Endpoint::Result { .. } => "/result",
        }
    }

    /// Query parameters, excluding the `json=1` marker
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::ListGames => Vec::new(),
            Endpoint::Join { game, name } | Endpoint::Part { game, name } => {
                vec![("game", game.clone()), ("name", name.clone())]
            }
            Endpoint::ReadGame { game } => vec![("name", game.clone())],
            Endpoint::Sync {
                game,
                player,
                date,
                kia,
            } => vec![
                ("game", game.clone()),
                ("player", player.clone()),
                ("year", date.year.to_string()),
                ("day", date.day.to_string()),
                ("kia", kia.to_string()),
            ],
            Endpoint::Completed {
                game,
                player,
                date,
                contract,
                tier,
            } => vec![
                ("game", game.clone()),
                ("player", player.clone()),
                ("year", date.year.to_string()),
                ("day", date.day.to_string()),
                ("contract", contract.clone()),
                ("tier", tier.to_string()),
            ],
            Endpoint::Result { game, contract } => {
                vec![("game", game.clone()), ("contract", contract.clone())]
            }
        }
    }

    /// Full request URL against `address`
    pub fn url(&self, address: &ServerAddress) -> NetworkResult<Url> {
        let mut url = address.base_url()?;
        url.set_path(self.path());
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("json", "1");
            for (key, value) in self.params() {
                query.append_pair(key, &value);
            }
        }
        Ok(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_address() {
        let address = ServerAddress::default();
        assert_eq!(address.host, "127.0.0.1");
        assert_eq!(address.port, 8080);
        assert_eq!(address.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_list_url() {
        let url = Endpoint::ListGames.url(&ServerAddress::default()).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/?json=1");
    }

    #[test]
    fn test_completed_url_carries_all_params() {
        let endpoint = Endpoint::Completed {
            game: "g1".to_string(),
            player: "bob".to_string(),
            date: YDate::new(3, 40),
            contract: "FirstSatellite".to_string(),
            tier: 2,
        };
        let url = endpoint.url(&ServerAddress::new("race.example", 9000)).unwrap();
        assert_eq!(
            url.as_str(),
            "http://race.example:9000/completed?json=1&game=g1&player=bob&year=3&day=40&contract=FirstSatellite&tier=2"
        );
    }

    #[test]
    fn test_read_game_uses_name_param() {
        let endpoint = Endpoint::ReadGame {
            game: "g1".to_string(),
        };
        assert_eq!(endpoint.params(), vec![("name", "g1".to_string())]);
    }

    #[test]
    fn test_params_are_encoded() {
        let endpoint = Endpoint::Join {
            game: "moon race".to_string(),
            name: "Jeb&Bill".to_string(),
        };
        let url = endpoint.url(&ServerAddress::default()).unwrap();
        assert_eq!(url.query(), Some("json=1&game=moon+race&name=Jeb%26Bill"));
    }

    #[test]
    fn test_empty_host_is_rejected() {
        let address = ServerAddress::new("  ", 8080);
        assert!(matches!(
            Endpoint::ListGames.url(&address),
            Err(NetworkError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_ipv6_host() {
        let url = Endpoint::ListGames.url(&ServerAddress::new("::1", 8080)).unwrap();
        assert_eq!(url.as_str(), "http://[::1]:8080/?json=1");
    }
}
