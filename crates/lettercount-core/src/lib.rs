//! Lettercount - a counting game played in letters
//!
//! Players take turns posting the next number in a chat channel, spelled in
//! bijective base-26 (`a`, `b`, ... `z`, `aa`, `ab`, ...). This crate holds
//! the rules and the state handling; the chat platform and the durable
//! store sit behind traits.
//!
//! # Architecture
//!
//! - **Codec**: letters to numbers and back
//! - **State**: typed record over a key-value store, with legacy migration
//! - **Validator**: decides whether a submission is the next count
//! - **Admin**: operator resets of the sequence
//! - **Report**: daily progress summary
//! - **Game**: the event handlers tying it together
//!
//! # Example
//!
//! ```no_run
//! use lettercount_core::{Game, MemoryKv, Operators, RecordingNotifier, StateStore};
//! use std::sync::Arc;
//!
//! # async fn run() -> lettercount_core::Result<()> {
//! let store = StateStore::new(Arc::new(MemoryKv::new()));
//! store.migrate().await?;
//! let game = Game::new(store, Arc::new(RecordingNotifier::new()), Operators::new(["U0"]));
//! game.daily_report().await?;
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod codec;
pub mod error;
pub mod game;
pub mod kv;
pub mod notify;
pub mod report;
pub mod state;
pub mod validator;

pub use admin::{AdminCommand, Operators, Override, OverrideRejected};
pub use codec::{decode, encode, encode_nonzero, extract_token};
pub use error::{Error, Result};
pub use game::{Game, SubmissionOutcome};
pub use kv::{KvStore, MemoryKv};
pub use notify::{MessageRef, Notification, Notifier, Reaction, RecordingNotifier};
pub use report::ReportSummary;
pub use state::{
    CurrentCount, GameState, LastCounter, LastDailyCount, StateField, StatePatch, StateStore,
};
pub use validator::{validate, Candidate, Rejection, Submission, Verdict};
