//! Bot node - the service entry point.
//!
//! Architecture:
//! - Single process with one RocksDB store
//! - HTTP ingress for Slack events, slash commands and the report trigger
//! - Slack Web API (or the log) for everything the game says

use crate::api;
use crate::error::{Error, Result};
use crate::slack::{LogNotifier, SlackNotifier};
use crate::storage::RocksKv;
use lettercount_core::{Game, KvStore, Notifier, Operators, StateStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for the bot.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Data directory for storage
    pub data_dir: PathBuf,

    /// HTTP listen address
    pub api_addr: SocketAddr,

    /// Channel the game is played in
    pub channel: String,

    /// Identities allowed to reset the count
    pub admins: Vec<String>,

    /// Slack bot token; without one, notifications only go to the log
    pub slack_token: Option<String>,

    /// Slack Web API base URL
    pub slack_api_base: String,
}

impl BotConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        let data_dir = PathBuf::from(
            std::env::var("LETTERCOUNT_DATA_DIR").unwrap_or_else(|_| "./lettercount-data".to_string()),
        );

        let api_addr = std::env::var("LETTERCOUNT_API_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let api_addr = api_addr
            .parse()
            .map_err(|e| Error::Config(format!("Invalid LETTERCOUNT_API_ADDR {:?}: {}", api_addr, e)))?;

        let channel = std::env::var("LETTERCOUNT_CHANNEL")
            .ok()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Config("LETTERCOUNT_CHANNEL must be set".into()))?;

        let admins = std::env::var("LETTERCOUNT_ADMINS")
            .map(|s| parse_list(&s))
            .unwrap_or_default();

        let slack_token = std::env::var("SLACK_BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        let slack_api_base = std::env::var("SLACK_API_BASE")
            .unwrap_or_else(|_| "https://slack.com/api".to_string());

        Ok(Self {
            data_dir,
            api_addr,
            channel,
            admins,
            slack_token,
            slack_api_base,
        })
    }
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Shared state for request handlers.
pub struct BotState {
    pub game: Game,
    pub config: BotConfig,
}

impl BotState {
    /// Wire the game to a store and notifier, migrating stored state first.
    pub async fn open(
        config: BotConfig,
        kv: Arc<dyn KvStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let store = StateStore::new(kv);
        if store.migrate().await? {
            tracing::info!("Stored state upgraded to the current format");
        }

        let operators = Operators::new(config.admins.iter().cloned());
        if operators.is_empty() {
            tracing::warn!("No admins configured; count resets are disabled");
        }

        Ok(Self {
            game: Game::new(store, notifier, operators),
            config,
        })
    }
}

/// A running bot instance.
pub struct BotNode {
    state: Arc<BotState>,
}

impl BotNode {
    /// Open storage and build the notifier from config.
    pub async fn new(config: BotConfig) -> Result<Self> {
        // Ensure data directory exists
        std::fs::create_dir_all(&config.data_dir)?;

        let kv: Arc<dyn KvStore> = Arc::new(RocksKv::open(&config.data_dir)?);

        let notifier: Arc<dyn Notifier> = match &config.slack_token {
            Some(token) => Arc::new(SlackNotifier::new(
                config.slack_api_base.as_str(),
                token.as_str(),
                config.channel.as_str(),
            )?),
            None => {
                tracing::warn!("SLACK_BOT_TOKEN not set; notifications go to the log only");
                Arc::new(LogNotifier)
            }
        };

        let state = BotState::open(config, kv, notifier).await?;
        Ok(Self {
            state: Arc::new(state),
        })
    }

    /// Get the shared state (for API handlers).
    pub fn state(&self) -> Arc<BotState> {
        Arc::clone(&self.state)
    }

    /// Serve HTTP until the listener fails.
    pub async fn run(self) -> Result<()> {
        let config = &self.state.config;
        tracing::info!("Lettercount bot starting");
        tracing::info!("  API: http://{}", config.api_addr);
        tracing::info!("  Channel: {}", config.channel);
        tracing::info!("  Admins: {}", config.admins.len());
        tracing::info!("  Data: {:?}", config.data_dir);

        let addr = config.api_addr;
        let app = api::build_router(self.state());

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("HTTP server listening on {}", addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
