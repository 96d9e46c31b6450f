//! Domain model for the Race Into Space client
//!
//! Dates, the server's wire documents decoded into typed records, and the
//! milestones whose completion the client reports.

pub mod error;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::{
    GameListing, GameState, GameSummary, Milestone, MilestoneRecord, MilestoneSource,
    PlayerRecord, PlayerResult, ResultReport, ResultVerdict, YDate, DAYS_PER_YEAR, SECONDS_PER_DAY,
};
