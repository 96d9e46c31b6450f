//! Error types for the race domain model

use thiserror::Error;

/// Result type for domain operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised when a domain invariant would be broken
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A report or verdict was applied to a milestone with no completion date
    #[error("Milestone {0} has not been completed")]
    NotCompleted(String),

    /// A persisted verdict integer outside the known range
    #[error("Invalid verdict index: {0}")]
    InvalidVerdict(u8),

    /// A persisted completion date outside the game calendar
    #[error("Invalid completion date: year {year}, day {day}")]
    InvalidDate { year: u32, day: u32 },
}
