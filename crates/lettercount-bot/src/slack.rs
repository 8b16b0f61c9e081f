//! Notifiers: the Slack Web API, and a log-only fallback.

use crate::error::Result;
use async_trait::async_trait;
use lettercount_core::{Error as GameError, MessageRef, Notifier, Reaction};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// Reply envelope shared by every Slack Web API method.
#[derive(Debug, Deserialize)]
struct SlackReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts to a single Slack channel with a bot token.
pub struct SlackNotifier {
    client: Client,
    api_base: String,
    token: String,
    channel: String,
}

impl SlackNotifier {
    pub fn new(
        api_base: impl Into<String>,
        token: impl Into<String>,
        channel: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            channel: channel.into(),
        })
    }

    /// Call a Web API method and check the `ok` flag.
    async fn call(&self, method: &str, body: serde_json::Value) -> lettercount_core::Result<()> {
        let url = format!("{}/{}", self.api_base, method);

        let reply: SlackReply = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| GameError::Notification(format!("{}: {}", method, e)))?
            .json()
            .await
            .map_err(|e| GameError::Notification(format!("{}: invalid reply: {}", method, e)))?;

        if !reply.ok {
            return Err(GameError::Notification(format!(
                "{}: {}",
                method,
                reply.error.unwrap_or_else(|| "unknown error".to_string())
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn post_message(&self, text: &str) -> lettercount_core::Result<()> {
        self.call(
            "chat.postMessage",
            json!({ "channel": self.channel, "text": text }),
        )
        .await
    }

    async fn post_ephemeral(&self, user: &str, text: &str) -> lettercount_core::Result<()> {
        self.call(
            "chat.postEphemeral",
            json!({ "channel": self.channel, "user": user, "text": text }),
        )
        .await
    }

    async fn add_reaction(
        &self,
        message: &MessageRef,
        reaction: Reaction,
    ) -> lettercount_core::Result<()> {
        self.call(
            "reactions.add",
            json!({
                "channel": message.channel,
                "timestamp": message.ts,
                "name": reaction.name(),
            }),
        )
        .await
    }
}

/// Writes notifications to the log instead of sending them.
///
/// Used when no bot token is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn post_message(&self, text: &str) -> lettercount_core::Result<()> {
        tracing::info!(%text, "post_message");
        Ok(())
    }

    async fn post_ephemeral(&self, user: &str, text: &str) -> lettercount_core::Result<()> {
        tracing::info!(%user, %text, "post_ephemeral");
        Ok(())
    }

    async fn add_reaction(
        &self,
        message: &MessageRef,
        reaction: Reaction,
    ) -> lettercount_core::Result<()> {
        tracing::info!(
            channel = %message.channel,
            ts = %message.ts,
            name = reaction.name(),
            "add_reaction"
        );
        Ok(())
    }
}
