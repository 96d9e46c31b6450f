use super::*;
use crate::host::ConsoleRewards;
use ris_core::{GameSummary, PlayerRecord, YDate};
use ris_sync_engine::FixedClock;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn idle_ports() -> HostPorts {
    HostPorts {
        achievements: Arc::new(BTreeMap::<String, YDate>::new()),
        rewards: Arc::new(ConsoleRewards),
        clock: Arc::new(FixedClock::new(YDate::EPOCH, 0)),
    }
}

fn open_in(dir: &TempDir, address: ServerAddress) -> Workspace {
    let manager = ConfigManager::with_directory(dir.path().to_path_buf()).unwrap();
    let stored = manager.load().unwrap();
    Workspace::open(manager, stored, address, idle_ports()).unwrap()
}

fn saved_config(dir: &TempDir) -> Config {
    ConfigManager::with_directory(dir.path().to_path_buf())
        .unwrap()
        .load()
        .unwrap()
}

fn game() -> GameState {
    let mut players = BTreeMap::new();
    players.insert(
        "alice".to_string(),
        PlayerRecord {
            date: YDate::new(2, 10),
            is_leader: true,
        },
    );
    players.insert(
        "bob".to_string(),
        PlayerRecord {
            date: YDate::new(1, 300),
            is_leader: false,
        },
    );
    GameState {
        min_date: YDate::new(1, 300),
        players,
    }
}

#[test]
fn test_listing_lines() {
    let mut listing = GameListing::new();
    listing.insert(
        "g1".to_string(),
        GameSummary {
            min_date: YDate::new(1, 1),
            players: vec!["alice".to_string(), "bob".to_string()],
        },
    );

    let lines = listing_lines(&listing);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("g1"));
    assert!(lines[0].contains("y1d001"));
    assert!(lines[0].ends_with("players: alice, bob"));
}

#[test]
fn test_player_lines_mark_self_and_leader() {
    let lines = player_lines(&game(), Some("bob"));
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("  alice"));
    assert!(lines[0].ends_with("(leader)"));
    assert!(lines[1].starts_with("> bob"));
    assert!(lines[1].contains("y1d300"));
}

#[test]
fn test_milestone_line_states() {
    let mut milestone = Milestone::single("FirstSatellite", 25_000.0, 1, "satellite");
    assert!(milestone_line(&milestone).ends_with("open"));

    milestone.mark_completed(YDate::new(1, 40));
    assert!(milestone_line(&milestone).ends_with("unreported"));

    milestone.mark_reported().unwrap();
    assert!(milestone_line(&milestone).ends_with("awaiting verdict"));

    milestone.apply_verdict(ResultVerdict::NotFirst).unwrap();
    let line = milestone_line(&milestone);
    assert!(line.contains("y1d040"));
    assert!(line.ends_with("not first"));
}

#[test]
fn test_run_address_is_not_saved() {
    let dir = TempDir::new().unwrap();
    let mut ws = open_in(&dir, ServerAddress::new("race.example", 9000));
    assert_eq!(
        ws.engine.session_snapshot().unwrap().address,
        ServerAddress::new("race.example", 9000)
    );

    ws.save().unwrap();
    let saved = saved_config(&dir);
    assert_eq!(saved.server.host, "127.0.0.1");
    assert_eq!(saved.server.port, 8080);
}

#[test]
fn test_server_command_is_saved() {
    let dir = TempDir::new().unwrap();
    let mut ws = open_in(&dir, ServerAddress::new("race.example", 9000));

    set_server(&mut ws, "moon.example", 7000).unwrap();
    ws.save().unwrap();

    let saved = saved_config(&dir);
    assert_eq!(saved.server.host, "moon.example");
    assert_eq!(saved.server.port, 7000);

    let reopened = open_in(&dir, ServerAddress::new("moon.example", 7000));
    assert_eq!(reopened.stored_address, ServerAddress::new("moon.example", 7000));
}
