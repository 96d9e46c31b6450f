//! Error types for sync operations

use ris_core::CoreError;
use ris_network::NetworkError;
use thiserror::Error;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during synchronization
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport, protocol or decode failure talking to the server
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// A milestone state transition was refused
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The operation needs a joined game
    #[error("Not joined to a game")]
    NotJoined,

    /// Another sync run is still outstanding
    #[error("Sync already in progress")]
    InProgress,

    /// No milestone with this id is tracked
    #[error("Unknown milestone: {0}")]
    UnknownMilestone(String),

    /// The server answered a report without mentioning us
    #[error("Server did not acknowledge {0} for the current player")]
    NotAcknowledged(String),

    /// Shared state was poisoned by a panicking holder
    #[error("Lock poisoned")]
    LockPoisoned,
}
