//! Synchronization engine and session operations
//!
//! A sync run is a chain of single calls:
//!
//! 1. **Report**: while the monitor finds a completed milestone the server has
//!    not acknowledged, send `/completed` for it.
//! 2. **Heartbeat**: send `/sync` with the current date and crew losses.
//! 3. **Resolve**: for every milestone still waiting on a verdict, ask
//!    `/result`, stopping at the first failure.
//!
//! What comes next is always recomputed from milestone state, so a run that
//! was cancelled or failed picks up where it stopped when started again.
//! State mutations happen between awaits while holding the lock, so an
//! abandoned call never leaves a half-applied update.

use crate::error::{SyncError, SyncResult};
use crate::monitor::MilestoneMonitor;
use crate::operation::{spawn_operation, CancelHandle};
use crate::ports::{AchievementSource, GameClock, RewardSink};
use crate::session::{JoinedGame, Session};
use chrono::Utc;
use ris_config::Config;
use ris_core::{GameListing, GameState, Milestone, ResultReport};
use ris_network::{decode, parse_document, Endpoint, ServerAddress, Transport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Collaborators supplied by the host
#[derive(Clone)]
pub struct HostPorts {
    pub achievements: Arc<dyn AchievementSource>,
    pub rewards: Arc<dyn RewardSink>,
    pub clock: Arc<dyn GameClock>,
}

/// A user-triggered operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ListGames,
    JoinGame { game: String, name: String },
    LeaveGame,
    ReadGame,
    Sync,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::ListGames => "ListGames",
            Action::JoinGame { .. } => "JoinGame",
            Action::LeaveGame => "PartGame",
            Action::ReadGame => "ReadGame",
            Action::Sync => "Sync",
        }
    }
}

struct SyncContext {
    transport: Arc<dyn Transport>,
    ports: HostPorts,
    session: Mutex<Session>,
    monitor: Mutex<MilestoneMonitor>,
    syncing: AtomicBool,
}

/// Releases the single-flight flag however the run ends
struct SyncGuard<'a>(&'a AtomicBool);

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> SyncResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::InProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Client side of the race protocol
///
/// Cheap to clone; clones share the same session and milestones.
#[derive(Clone)]
pub struct SyncEngine {
    ctx: Arc<SyncContext>,
}

impl SyncEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        ports: HostPorts,
        session: Session,
        monitor: MilestoneMonitor,
    ) -> Self {
        Self {
            ctx: Arc::new(SyncContext {
                transport,
                ports,
                session: Mutex::new(session),
                monitor: Mutex::new(monitor),
                syncing: AtomicBool::new(false),
            }),
        }
    }

    /// Builds an engine from persisted state
    pub fn from_config(
        transport: Arc<dyn Transport>,
        ports: HostPorts,
        config: &Config,
        mut monitor: MilestoneMonitor,
    ) -> Self {
        monitor.load(&config.milestones);
        Self::new(transport, ports, Session::from_config(&config.server), monitor)
    }

    fn session(&self) -> SyncResult<MutexGuard<'_, Session>> {
        self.ctx.session.lock().map_err(|_| SyncError::LockPoisoned)
    }

    fn monitor(&self) -> SyncResult<MutexGuard<'_, MilestoneMonitor>> {
        self.ctx.monitor.lock().map_err(|_| SyncError::LockPoisoned)
    }

    /// Copy of the current session
    pub fn session_snapshot(&self) -> SyncResult<Session> {
        Ok(self.session()?.clone())
    }

    /// Copy of every tracked milestone, in monitor order
    pub fn milestones(&self) -> SyncResult<Vec<Milestone>> {
        Ok(self.monitor()?.milestones().to_vec())
    }

    pub fn is_syncing(&self) -> bool {
        self.ctx.syncing.load(Ordering::Acquire)
    }

    /// Points the session at another server
    pub fn set_server(&self, address: ServerAddress) -> SyncResult<()> {
        self.session()?.address = address;
        Ok(())
    }

    /// Writes session and milestone state into `config`
    pub fn save_into(&self, config: &mut Config) -> SyncResult<()> {
        self.session()?.write_config(&mut config.server);
        config.milestones = self.monitor()?.save();
        Ok(())
    }

    fn address(&self) -> SyncResult<ServerAddress> {
        Ok(self.session()?.address.clone())
    }

    fn joined(&self) -> SyncResult<(ServerAddress, JoinedGame)> {
        let session = self.session()?;
        let joined = session.joined.clone().ok_or(SyncError::NotJoined)?;
        Ok((session.address.clone(), joined))
    }

    async fn fetch(&self, address: &ServerAddress, endpoint: &Endpoint) -> SyncResult<String> {
        let body = self.ctx.transport.fetch(address, endpoint).await?;
        log::debug!("{}: {}", endpoint, body);
        Ok(body)
    }

    /// Fetches the game listing and replaces the cached one
    pub async fn list_games(&self) -> SyncResult<GameListing> {
        let address = self.address()?;
        let body = self.fetch(&address, &Endpoint::ListGames).await?;
        let listing: GameListing = decode(&body)?;

        log::info!("Listed {} games", listing.len());
        self.session()?.listing = Some(listing.clone());
        Ok(listing)
    }

    /// Joins `game` as `name`; the session changes only on success
    pub async fn join_game(&self, game: &str, name: &str) -> SyncResult<()> {
        let address = self.address()?;
        let endpoint = Endpoint::Join {
            game: game.to_string(),
            name: name.to_string(),
        };
        let body = self.fetch(&address, &endpoint).await?;
        let state: GameState = decode(&body)?;

        let mut session = self.session()?;
        session.joined = Some(JoinedGame {
            game_id: game.to_string(),
            player: name.to_string(),
        });
        session.game = Some(state);
        log::info!("Joined game {} as {}", game, name);
        Ok(())
    }

    /// Leaves the joined game
    ///
    /// A "no such entry" answer means we were already gone and counts as
    /// success. Any other failure keeps the session joined.
    pub async fn leave_game(&self) -> SyncResult<()> {
        let (address, joined) = match self.joined() {
            Ok(found) => found,
            Err(SyncError::NotJoined) => {
                log::info!("Not in a game, nothing to leave");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let endpoint = Endpoint::Part {
            game: joined.game_id.clone(),
            name: joined.player.clone(),
        };
        let body = self.fetch(&address, &endpoint).await?;
        match parse_document(&body) {
            Ok(_) => {}
            Err(e) if e.is_no_entry() => log::info!("Player was already parted"),
            Err(e) => return Err(e.into()),
        }

        let mut session = self.session()?;
        if session.joined.as_ref() == Some(&joined) {
            session.clear_joined();
        }
        log::info!("Left game {}", joined.game_id);
        Ok(())
    }

    /// Refreshes the joined game's state
    pub async fn read_game(&self) -> SyncResult<()> {
        let (address, joined) = self.joined()?;
        let endpoint = Endpoint::ReadGame {
            game: joined.game_id.clone(),
        };
        let body = self.fetch(&address, &endpoint).await?;
        let state: GameState = decode(&body)?;

        self.store_game_state(&joined, state)
    }

    fn store_game_state(&self, joined: &JoinedGame, state: GameState) -> SyncResult<()> {
        let mut session = self.session()?;
        if session.joined.as_ref() == Some(joined) {
            session.game = Some(state);
        } else {
            log::warn!("Discarding state of {}: no longer joined", joined.game_id);
        }
        Ok(())
    }

    /// Reports one completed milestone
    ///
    /// On success the milestone is marked reported and takes the verdict the
    /// server returned for us. A response that does not mention us changes
    /// nothing and fails with [`SyncError::NotAcknowledged`].
    pub async fn report(&self, id: &str) -> SyncResult<()> {
        let (address, joined) = self.joined()?;
        let (date, tier) = {
            let monitor = self.monitor()?;
            let milestone = monitor
                .get(id)
                .ok_or_else(|| SyncError::UnknownMilestone(id.to_string()))?;
            let date = milestone
                .completed_on()
                .ok_or_else(|| ris_core::CoreError::NotCompleted(id.to_string()))?;
            (date, milestone.tier())
        };

        log::info!("Reporting {} completed at {}", id, date);
        let endpoint = Endpoint::Completed {
            game: joined.game_id.clone(),
            player: joined.player.clone(),
            date,
            contract: id.to_string(),
            tier,
        };
        let body = self.fetch(&address, &endpoint).await?;
        let report: ResultReport = decode(&body)?;

        let Some(entry) = report.for_player(&joined.player) else {
            return Err(SyncError::NotAcknowledged(id.to_string()));
        };

        let reward = {
            let mut monitor = self.monitor()?;
            let milestone = monitor
                .get_mut(id)
                .ok_or_else(|| SyncError::UnknownMilestone(id.to_string()))?;
            milestone.mark_reported()?;
            milestone
                .apply_verdict(entry.verdict)?
                .then(|| milestone.reward())
        };
        self.grant(id, reward);
        Ok(())
    }

    /// Asks the server for a milestone's verdict
    ///
    /// Only the verdict changes; the report flag is left alone.
    pub async fn resolve(&self, id: &str) -> SyncResult<()> {
        let (address, joined) = self.joined()?;
        if self.monitor()?.get(id).is_none() {
            return Err(SyncError::UnknownMilestone(id.to_string()));
        }

        log::info!("Resolving {}", id);
        let endpoint = Endpoint::Result {
            game: joined.game_id.clone(),
            contract: id.to_string(),
        };
        let body = self.fetch(&address, &endpoint).await?;
        let report: ResultReport = decode(&body)?;

        let Some(entry) = report.for_player(&joined.player) else {
            log::debug!("No verdict for {} yet", id);
            return Ok(());
        };

        let reward = {
            let mut monitor = self.monitor()?;
            let milestone = monitor
                .get_mut(id)
                .ok_or_else(|| SyncError::UnknownMilestone(id.to_string()))?;
            milestone
                .apply_verdict(entry.verdict)?
                .then(|| milestone.reward())
        };
        self.grant(id, reward);
        Ok(())
    }

    fn grant(&self, id: &str, reward: Option<f64>) {
        if let Some(amount) = reward {
            log::info!("Awarding {} funds for being first to complete {}", amount, id);
            self.ctx.ports.rewards.grant_reward(amount, id);
        }
    }

    /// Pushes the current date and crew losses; replaces the game state
    pub async fn heartbeat(&self) -> SyncResult<()> {
        let (address, joined) = self.joined()?;
        let clock = &self.ctx.ports.clock;
        let endpoint = Endpoint::Sync {
            game: joined.game_id.clone(),
            player: joined.player.clone(),
            date: clock.current_date(),
            kia: clock.dead_crew_count(),
        };
        let body = self.fetch(&address, &endpoint).await?;
        let state: GameState = decode(&body)?;

        self.store_game_state(&joined, state)
    }

    /// Runs the full report, heartbeat and resolve chain
    ///
    /// Only one run at a time; a second concurrent call fails with
    /// [`SyncError::InProgress`].
    pub async fn sync(&self) -> SyncResult<()> {
        let _guard = SyncGuard::acquire(&self.ctx.syncing)?;
        self.joined()?;

        while let Some(id) = self.next_to_report()? {
            self.report(&id).await?;
        }

        self.heartbeat().await?;

        let pending: Vec<String> = self
            .monitor()?
            .to_resolve()
            .into_iter()
            .map(|m| m.id().to_string())
            .collect();
        for id in pending {
            self.resolve(&id).await?;
        }

        self.session()?.last_sync = Some(Utc::now());
        log::info!("Sync complete");
        Ok(())
    }

    fn next_to_report(&self) -> SyncResult<Option<String>> {
        let ports = &self.ctx.ports;
        let mut monitor = self.monitor()?;
        Ok(monitor
            .check_all(ports.achievements.as_ref(), ports.clock.as_ref())
            .map(|m| m.id().to_string()))
    }

    /// Runs `action` in the background
    ///
    /// `on_complete` receives the outcome unless the returned handle is
    /// cancelled first. Must be called from within a Tokio runtime.
    pub fn start<C>(&self, action: Action, on_complete: C) -> CancelHandle
    where
        C: FnOnce(bool) + Send + 'static,
    {
        let engine = self.clone();
        let name = action.name();
        spawn_operation(name, async move { engine.run(action).await }, on_complete)
    }

    /// Runs `action` to completion
    pub async fn run(&self, action: Action) -> SyncResult<()> {
        match action {
            Action::ListGames => self.list_games().await.map(|_| ()),
            Action::JoinGame { game, name } => self.join_game(&game, &name).await,
            Action::LeaveGame => self.leave_game().await,
            Action::ReadGame => self.read_game().await,
            Action::Sync => self.sync().await,
        }
    }
}
