//! Error types for the bot service.

use thiserror::Error;

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the bot.
#[derive(Debug, Error)]
pub enum Error {
    /// Game or state error
    #[error(transparent)]
    Game(#[from] lettercount_core::Error),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(e: rocksdb::Error) -> Self {
        Error::Storage(e.to_string())
    }
}
