//! Outbound notifications.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Identifies a chat message to react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    /// Channel the message was posted in
    pub channel: String,
    /// Platform timestamp/ID of the message
    pub ts: String,
}

impl MessageRef {
    pub fn new(channel: impl Into<String>, ts: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ts: ts.into(),
        }
    }
}

/// The acknowledgement put on every submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    Accepted,
    Rejected,
}

impl Reaction {
    /// Emoji name as the chat platform knows it.
    pub fn name(self) -> &'static str {
        match self {
            Reaction::Accepted => "white_check_mark",
            Reaction::Rejected => "bangbang",
        }
    }
}

/// Sink for everything the game says.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post a message visible to the whole game channel.
    async fn post_message(&self, text: &str) -> Result<()>;

    /// Post a message only `user` can see.
    async fn post_ephemeral(&self, user: &str, text: &str) -> Result<()>;

    /// React to a message.
    async fn add_reaction(&self, message: &MessageRef, reaction: Reaction) -> Result<()>;
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Public { text: String },
    Ephemeral { user: String, text: String },
    Reaction { message: MessageRef, reaction: Reaction },
}

/// Notifier that keeps everything in memory.
///
/// Useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, in order.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    /// Drain the captured notifications.
    pub async fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.sent.lock().await)
    }

    async fn record(&self, notification: Notification) {
        self.sent.lock().await.push(notification);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn post_message(&self, text: &str) -> Result<()> {
        self.record(Notification::Public {
            text: text.to_string(),
        })
        .await;
        Ok(())
    }

    async fn post_ephemeral(&self, user: &str, text: &str) -> Result<()> {
        self.record(Notification::Ephemeral {
            user: user.to_string(),
            text: text.to_string(),
        })
        .await;
        Ok(())
    }

    async fn add_reaction(&self, message: &MessageRef, reaction: Reaction) -> Result<()> {
        self.record(Notification::Reaction {
            message: message.clone(),
            reaction,
        })
        .await;
        Ok(())
    }
}
