//! Lettercount bot - Slack service for the lettercount game
//!
//! Receives channel messages and slash commands from Slack, runs them
//! through [`lettercount_core::Game`], and answers through the Slack Web API.
//!
//! # Architecture
//!
//! - **Storage**: RocksDB-backed key-value store
//! - **Slack**: Web API notifier, with a log-only fallback
//! - **API**: HTTP endpoints for Slack events, commands and the daily report
//! - **Node**: configuration and wiring
//!
//! # Example
//!
//! ```no_run
//! use lettercount_bot::{BotConfig, BotNode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BotConfig::from_env()?;
//!     let node = BotNode::new(config).await?;
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod error;
pub mod node;
pub mod slack;
pub mod storage;

pub use error::{Error, Result};
pub use node::{BotConfig, BotNode, BotState};
pub use slack::{LogNotifier, SlackNotifier};
pub use storage::RocksKv;
