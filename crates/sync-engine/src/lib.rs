//! Race synchronization engine
//!
//! Reports locally detected milestone completions to the race server, keeps
//! it informed of the player's date, and pulls back who was first.
//!
//! - [`operation`]: cancellable background operations with one completion
//! - [`Trigger`]: button-style wrapper, a second press cancels
//! - [`MilestoneMonitor`]: decides what needs reporting or resolving
//! - [`SyncEngine`]: the session operations and the sync chain
//!
//! # Example
//!
//! ```rust,no_run
//! use ris_core::{Milestone, YDate};
//! use ris_network::Client;
//! use ris_sync_engine::{Action, FixedClock, HostPorts, MilestoneMonitor, RewardSink, Session, SyncEngine};
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! struct PrintRewards;
//! impl RewardSink for PrintRewards {
//!     fn grant_reward(&self, amount: f64, milestone: &str) {
//!         println!("{amount} funds for {milestone}");
//!     }
//! }
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut achievements = BTreeMap::new();
//! achievements.insert("satellite".to_string(), YDate::new(1, 40));
//!
//! let engine = SyncEngine::new(
//!     Arc::new(Client::new()?),
//!     HostPorts {
//!         achievements: Arc::new(achievements),
//!         rewards: Arc::new(PrintRewards),
//!         clock: Arc::new(FixedClock::new(YDate::new(1, 41), 0)),
//!     },
//!     Session::default(),
//!     MilestoneMonitor::new([Milestone::single("FirstSatellite", 25_000.0, 1, "satellite")]),
//! );
//!
//! engine.join_game("g1", "bob").await?;
//! let handle = engine.start(Action::Sync, |ok| println!("sync finished: {ok}"));
//! # handle.cancel();
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod monitor;
pub mod operation;
mod ports;
mod session;
mod trigger;

pub use engine::{Action, HostPorts, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use monitor::MilestoneMonitor;
pub use operation::{spawn_operation, CancelHandle, Completion};
pub use ports::{AchievementSource, FixedClock, GameClock, RewardSink};
pub use session::{JoinedGame, Session};
pub use trigger::{Trigger, TriggerState};
