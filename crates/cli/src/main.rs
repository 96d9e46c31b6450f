use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use ris_config::ConfigManager;
use ris_core::YDate;
use ris_network::ServerAddress;
use ris_sync_engine::{FixedClock, HostPorts};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

mod commands;
mod host;

use commands::Workspace;

fn build_cli() -> Command {
    Command::new("ris")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Race Into Space client: join a race and synchronize milestones")
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding state.toml and milestones.toml")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Server host for this run")
                .global(true),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT")
                .help("Server port for this run")
                .value_parser(value_parser!(u16))
                .global(true),
        )
        .subcommand(Command::new("list").about("List games on the server"))
        .subcommand(
            Command::new("join")
                .about("Join a game")
                .arg(Arg::new("game").required(true).value_name("GAME").help("Game id"))
                .arg(Arg::new("name").required(true).value_name("NAME").help("Player name")),
        )
        .subcommand(Command::new("leave").about("Leave the joined game"))
        .subcommand(Command::new("refresh").about("Re-read the joined game"))
        .subcommand(
            Command::new("sync")
                .about("Report completed milestones, send a heartbeat and fetch verdicts")
                .arg(
                    Arg::new("ut")
                        .long("ut")
                        .value_name("SECONDS")
                        .help("Elapsed game time in seconds")
                        .value_parser(value_parser!(f64))
                        .required(true),
                )
                .arg(
                    Arg::new("kia")
                        .long("kia")
                        .value_name("COUNT")
                        .help("Crew lost so far")
                        .value_parser(value_parser!(u32))
                        .default_value("0"),
                )
                .arg(
                    Arg::new("achievements")
                        .long("achievements")
                        .value_name("FILE")
                        .help("Achievements file (defaults to achievements.toml in the config directory)")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(Command::new("status").about("Show server, game and milestone state"))
        .subcommand(
            Command::new("server")
                .about("Set the server address")
                .arg(Arg::new("host").required(true).value_name("HOST").help("Server host"))
                .arg(
                    Arg::new("port")
                        .required(true)
                        .value_name("PORT")
                        .help("Server port")
                        .value_parser(value_parser!(u16)),
                ),
        )
}

fn host_ports(matches: &ArgMatches, manager: &ConfigManager) -> Result<HostPorts> {
    let rewards = Arc::new(host::ConsoleRewards);

    let Some(("sync", sub)) = matches.subcommand() else {
        return Ok(HostPorts {
            achievements: Arc::new(BTreeMap::<String, YDate>::new()),
            rewards,
            clock: Arc::new(FixedClock::new(YDate::EPOCH, 0)),
        });
    };

    let path = sub
        .get_one::<PathBuf>("achievements")
        .cloned()
        .unwrap_or_else(|| manager.config_dir().join(host::ACHIEVEMENTS_FILE));
    let ut = sub.get_one::<f64>("ut").copied().unwrap_or_default();
    let kia = sub.get_one::<u32>("kia").copied().unwrap_or_default();

    Ok(HostPorts {
        achievements: Arc::new(host::load_achievements(&path)?),
        rewards,
        clock: Arc::new(FixedClock::at_universal_time(ut, kia)),
    })
}

async fn dispatch(ws: &mut Workspace, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => commands::list_games(ws).await,
        Some(("join", sub)) => {
            let game = sub
                .get_one::<String>("game")
                .ok_or_else(|| anyhow::anyhow!("Game id is required"))?;
            let name = sub
                .get_one::<String>("name")
                .ok_or_else(|| anyhow::anyhow!("Player name is required"))?;
            commands::join_game(ws, game, name).await
        }
        Some(("leave", _)) => commands::leave_game(ws).await,
        Some(("refresh", _)) => commands::refresh(ws).await,
        Some(("sync", _)) => commands::sync(ws).await,
        Some(("status", _)) => commands::status(ws),
        Some(("server", sub)) => {
            let host = sub
                .get_one::<String>("host")
                .ok_or_else(|| anyhow::anyhow!("Host is required"))?;
            let port = sub
                .get_one::<u16>("port")
                .copied()
                .ok_or_else(|| anyhow::anyhow!("Port is required"))?;
            commands::set_server(ws, host, port)
        }
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let manager = match matches.get_one::<PathBuf>("config-dir") {
        Some(dir) => ConfigManager::with_directory(dir.clone()),
        None => ConfigManager::new(),
    }
    .context("Failed to locate configuration directory")?;
    let stored = manager.load().context("Failed to load state")?;

    // Environment and flags only steer this run; they are never saved
    let mut effective = stored.clone();
    manager.apply_env(&mut effective);
    if let Some(host) = matches.get_one::<String>("host") {
        effective.server.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        effective.server.port = *port;
    }

    env_logger::Builder::new()
        .filter_level(effective.app.log_level.into())
        .parse_default_env()
        .init();

    let address = ServerAddress::new(effective.server.host, effective.server.port);
    let ports = host_ports(&matches, &manager)?;
    let mut ws = Workspace::open(manager, stored, address, ports)?;

    let outcome = dispatch(&mut ws, &matches).await;
    // Committed progress is kept even when the command failed part way
    let saved = ws.save();
    outcome?;
    saved
}

#[cfg(test)]
mod tests {
    use super::*;
    use ris_sync_engine::GameClock;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_sync_args() {
        let matches = build_cli()
            .try_get_matches_from(["ris", "sync", "--ut", "86400", "--kia", "2"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "sync");
        assert_eq!(sub.get_one::<f64>("ut"), Some(&86400.0));
        assert_eq!(sub.get_one::<u32>("kia"), Some(&2));
    }

    #[test]
    fn test_sync_requires_time() {
        assert!(build_cli().try_get_matches_from(["ris", "sync"]).is_err());
    }

    #[test]
    fn test_global_server_override() {
        let matches = build_cli()
            .try_get_matches_from(["ris", "list", "--host", "race.example", "--port", "9000"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("host").map(String::as_str), Some("race.example"));
        assert_eq!(matches.get_one::<u16>("port"), Some(&9000));
    }

    #[test]
    fn test_non_sync_ports_use_epoch() {
        let dir = tempfile::TempDir::new().unwrap();
        let manager = ConfigManager::with_directory(dir.path().to_path_buf()).unwrap();
        let matches = build_cli().try_get_matches_from(["ris", "status"]).unwrap();
        let ports = host_ports(&matches, &manager).unwrap();
        assert_eq!(ports.clock.current_date(), YDate::EPOCH);
        assert_eq!(ports.clock.dead_crew_count(), 0);
    }
}
