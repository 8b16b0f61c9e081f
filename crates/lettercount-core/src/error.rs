//! Error types for lettercount.

use thiserror::Error;

/// Result type for lettercount operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the game.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input (e.g. encoding zero)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A token could not be turned into a number
    #[error("Decode error: {0}")]
    Decode(String),

    /// Key-value store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Outbound notification failed
    #[error("Notification error: {0}")]
    Notification(String),
}
