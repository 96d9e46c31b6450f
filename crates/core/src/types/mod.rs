//! Domain types for the race client
//!
//! - `date`: in-game calendar values
//! - `game`: game listing and joined-game snapshots
//! - `verdict`: race verdicts and result documents
//! - `milestone`: tracked achievements and their persisted state

mod date;
mod game;
mod milestone;
mod verdict;

pub use date::{YDate, DAYS_PER_YEAR, SECONDS_PER_DAY};
pub use game::{GameListing, GameState, GameSummary, PlayerRecord};
pub use milestone::{Milestone, MilestoneRecord, MilestoneSource};
pub use verdict::{PlayerResult, ResultReport, ResultVerdict};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let _: YDate = YDate::EPOCH;
        let _: ResultVerdict = ResultVerdict::default();
        let _: ResultReport = ResultReport::default();
        let _: GameListing = GameListing::new();
        let _: Milestone = Milestone::single("m", 0.0, 0, "s");
    }
}
