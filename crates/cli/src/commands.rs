use anyhow::{bail, Context, Result};
use console::style;
use ris_config::{Config, ConfigManager};
use ris_core::{GameListing, GameState, Milestone, ResultVerdict};
use ris_network::{Client, ServerAddress};
use ris_sync_engine::{Action, HostPorts, MilestoneMonitor, Session, SyncEngine, Trigger};
use std::sync::Arc;
use tokio::sync::oneshot;

#[cfg(test)]
mod tests;

/// Loaded state plus the engine working on it
pub struct Workspace {
    manager: ConfigManager,
    config: Config,
    engine: SyncEngine,
    /// Address written back on save; only `server` changes it
    stored_address: ServerAddress,
}

impl Workspace {
    /// Opens the engine over `config`, talking to `address` for this run
    pub fn open(
        manager: ConfigManager,
        config: Config,
        address: ServerAddress,
        ports: HostPorts,
    ) -> Result<Self> {
        let catalog = manager
            .load_catalog()
            .context("Failed to load milestone catalog")?;
        let milestones = catalog.build().context("Invalid milestone catalog")?;
        let transport = Arc::new(Client::new().context("Failed to create HTTP client")?);
        let engine = SyncEngine::from_config(
            transport,
            ports,
            &config,
            MilestoneMonitor::new(milestones),
        );

        let stored_address = ServerAddress::new(config.server.host.clone(), config.server.port);
        if address != stored_address {
            log::info!("Using server {} for this run", address);
            engine.set_server(address)?;
        }

        Ok(Self {
            manager,
            config,
            engine,
            stored_address,
        })
    }

    /// Persists whatever the engine has committed
    pub fn save(&mut self) -> Result<()> {
        self.engine
            .save_into(&mut self.config)
            .context("Failed to collect state")?;
        self.config.server.host = self.stored_address.host.clone();
        self.config.server.port = self.stored_address.port;
        self.manager
            .save(&self.config)
            .context("Failed to save state")
    }
}

/// Runs one action; Ctrl-C cancels the outstanding call
async fn run_action(engine: &SyncEngine, action: Action) -> bool {
    let name = action.name();
    let (tx, rx) = oneshot::channel();
    let trigger = Trigger::new();

    trigger.press(|done| {
        engine.start(action, move |ok| {
            done(ok);
            let _ = tx.send(ok);
        })
    });

    tokio::select! {
        outcome = rx => outcome.unwrap_or(false),
        _ = tokio::signal::ctrl_c() => {
            trigger.reset();
            println!("{} {} cancelled", style("✗").yellow().bold(), name);
            false
        }
    }
}

fn require(ok: bool, what: &str) -> Result<()> {
    if !ok {
        bail!("{} failed (see log for details)", what);
    }
    Ok(())
}

/// List games on the server
pub async fn list_games(ws: &mut Workspace) -> Result<()> {
    require(run_action(&ws.engine, Action::ListGames).await, "Listing games")?;

    let session = ws.engine.session_snapshot()?;
    let listing = session.listing.unwrap_or_default();
    if listing.is_empty() {
        println!("No games on {}. Ask the server admin to create one.", session.address);
        return Ok(());
    }

    println!("\n{} Games on {}", style(listing.len()).bold().cyan(), session.address);
    println!("{}", "=".repeat(60));
    for line in listing_lines(&listing) {
        println!("{}", line);
    }
    Ok(())
}

/// Join a game under a player name
pub async fn join_game(ws: &mut Workspace, game: &str, name: &str) -> Result<()> {
    if let Some(joined) = ws.engine.session_snapshot()?.joined {
        bail!(
            "Already in game '{}' as '{}'; leave it first",
            joined.game_id,
            joined.player
        );
    }

    let action = Action::JoinGame {
        game: game.to_string(),
        name: name.to_string(),
    };
    require(run_action(&ws.engine, action).await, "Joining")?;

    println!("{} Joined '{}' as '{}'", style("✓").green().bold(), game, name);
    print_game(&ws.engine.session_snapshot()?);
    Ok(())
}

/// Leave the joined game
pub async fn leave_game(ws: &mut Workspace) -> Result<()> {
    let Some(joined) = ws.engine.session_snapshot()?.joined else {
        println!("Not in a game.");
        return Ok(());
    };

    require(run_action(&ws.engine, Action::LeaveGame).await, "Leaving")?;
    println!("{} Left '{}'", style("✓").green().bold(), joined.game_id);
    Ok(())
}

/// Re-read the joined game
pub async fn refresh(ws: &mut Workspace) -> Result<()> {
    require(run_action(&ws.engine, Action::ReadGame).await, "Refreshing")?;
    print_game(&ws.engine.session_snapshot()?);
    Ok(())
}

/// Report, heartbeat and resolve
pub async fn sync(ws: &mut Workspace) -> Result<()> {
    let ok = run_action(&ws.engine, Action::Sync).await;
    print_milestones(&ws.engine.milestones()?);
    require(ok, "Sync")?;

    println!("{} Synchronized", style("✓").green().bold());
    print_game(&ws.engine.session_snapshot()?);
    Ok(())
}

/// Show server, game and milestones
pub fn status(ws: &Workspace) -> Result<()> {
    let session = ws.engine.session_snapshot()?;
    println!("\n{}", style("Race Into Space").bold().cyan());
    println!("Server: {}", session.address);
    match &session.joined {
        Some(joined) => println!("Game:   {} (as {})", joined.game_id, joined.player),
        None => println!("Game:   {}", style("not joined").dim()),
    }
    if let Some(when) = session.last_sync {
        println!("Synced: {}", when.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    print_game(&session);
    print_milestones(&ws.engine.milestones()?);
    Ok(())
}

/// Point the client at another server
pub fn set_server(ws: &mut Workspace, host: &str, port: u16) -> Result<()> {
    let address = ServerAddress::new(host, port);
    address.base_url().context("Invalid server address")?;
    ws.engine.set_server(address.clone())?;
    ws.stored_address = address.clone();
    println!("{} Server set to {}", style("✓").green().bold(), address);
    Ok(())
}

fn print_game(session: &Session) {
    let Some(game) = &session.game else {
        return;
    };
    let me = session.joined.as_ref().map(|j| j.player.as_str());

    println!("\nGame date floor: {}", game.min_date);
    println!("{}", "-".repeat(40));
    for line in player_lines(game, me) {
        println!("{}", line);
    }
}

fn print_milestones(milestones: &[Milestone]) {
    if milestones.is_empty() {
        return;
    }
    println!("\n{}", style("Milestones").bold());
    println!("{}", "-".repeat(60));
    for milestone in milestones {
        println!("{}", milestone_line(milestone));
    }
}

pub(crate) fn listing_lines(listing: &GameListing) -> Vec<String> {
    listing
        .iter()
        .map(|(id, summary)| {
            format!(
                "{:<16} {}  players: {}",
                id,
                summary.min_date,
                summary.players.join(", ")
            )
        })
        .collect()
}

pub(crate) fn player_lines(game: &GameState, me: Option<&str>) -> Vec<String> {
    game.players
        .iter()
        .map(|(name, record)| {
            let marker = if Some(name.as_str()) == me { ">" } else { " " };
            let leader = if record.is_leader { " (leader)" } else { "" };
            format!("{} {:<16} {}{}", marker, name, record.date, leader)
        })
        .collect()
}

pub(crate) fn milestone_line(milestone: &Milestone) -> String {
    let completed = milestone
        .completed_on()
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    let status = match (milestone.is_completed(), milestone.is_reported(), milestone.verdict()) {
        (false, _, _) => "open".to_string(),
        (true, false, ResultVerdict::Unknown) => "unreported".to_string(),
        (true, _, ResultVerdict::Unknown) => "awaiting verdict".to_string(),
        (true, _, verdict) => verdict.to_string(),
    };
    format!(
        "{:<24} tier {} {:>10.0}  {:<9} {}",
        milestone.id(),
        milestone.tier(),
        milestone.reward(),
        completed,
        status
    )
}
