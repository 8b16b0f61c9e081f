//! Event handlers.
//!
//! Each call handles one inbound event from start to finish. Nothing is kept
//! between calls; state is read from the store on every event, so handlers
//! running at the same time can race (see [`crate::state`]).

use crate::admin::{AdminCommand, Operators, Override, OverrideRejected};
use crate::error::Result;
use crate::notify::{Notifier, Reaction};
use crate::report::ReportSummary;
use crate::state::{CurrentCount, LastDailyCount, StatePatch, StateStore};
use crate::validator::{validate, Rejection, Submission, Verdict};
use std::num::NonZeroU64;
use std::sync::Arc;

/// What happened to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Not a count; nothing was done
    Ignored,
    Accepted { count: u64 },
    Rejected(Rejection),
}

/// The counting game bound to a store and a notifier.
#[derive(Clone)]
pub struct Game {
    store: StateStore,
    notifier: Arc<dyn Notifier>,
    operators: Operators,
}

impl Game {
    pub fn new(store: StateStore, notifier: Arc<dyn Notifier>, operators: Operators) -> Self {
        Self {
            store,
            notifier,
            operators,
        }
    }

    /// The backing state store.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Handle a chat message that might be a count.
    ///
    /// Reacts to every count and explains rejections privately. The reaction,
    /// the explanation and the state write are issued together and all of
    /// them finish before this returns; the first failure is reported.
    pub async fn handle_submission(&self, submission: &Submission) -> Result<SubmissionOutcome> {
        let Some(candidate) = submission.candidate() else {
            return Ok(SubmissionOutcome::Ignored);
        };
        tracing::debug!(?candidate, submitter = %submission.submitter, "Count submitted");

        let state = self.store.load().await?;
        if state.current_count.is_none() {
            // Bootstrap: the field exists from the first count on, even a wrong one.
            self.store.put::<CurrentCount>(0).await?;
        }
        let current = state.effective_count();

        let verdict = validate(
            candidate,
            &submission.submitter,
            current,
            state.last_counter.as_deref(),
        );

        match verdict {
            Verdict::Accepted { count } => {
                let patch = StatePatch::new()
                    .current_count(count)
                    .last_counter(submission.submitter.as_str());
                let (written, reacted) = futures::join!(
                    self.store.update_object(patch),
                    self.notifier
                        .add_reaction(&submission.message, Reaction::Accepted),
                );
                written?;
                reacted?;
                Ok(SubmissionOutcome::Accepted { count })
            }
            Verdict::Rejected(rejection) => {
                tracing::debug!(?candidate, current, ?rejection, "Count rejected");
                let text = rejection.to_string();
                let (explained, reacted) = futures::join!(
                    self.notifier.post_ephemeral(&submission.submitter, &text),
                    self.notifier
                        .add_reaction(&submission.message, Reaction::Rejected),
                );
                explained?;
                reacted?;
                Ok(SubmissionOutcome::Rejected(rejection))
            }
        }
    }

    /// Handle an operator reset.
    ///
    /// Returns the reply for the operator. Permission and decoding problems
    /// are replies too; only store or notification failures are errors.
    pub async fn handle_admin_command(&self, command: &AdminCommand) -> Result<String> {
        let reset = match Override::authorize(&self.operators, command) {
            Ok(reset) => reset,
            Err(rejected) => {
                if rejected == OverrideRejected::PermissionDenied {
                    tracing::warn!(operator = %command.operator, "Reset attempted without permission");
                }
                return Ok(rejected.to_string());
            }
        };

        self.store.update_object(reset.patch()).await?;
        tracing::info!(operator = %command.operator, next = reset.next.get(), "Count reset");

        self.notifier
            .post_message(&reset.announcement(&command.operator))
            .await?;

        Ok(format!("Done. The next number is {}.", reset.token))
    }

    /// Post the daily progress report.
    ///
    /// Does nothing until the game has a positive count. Otherwise records the
    /// current count as the new snapshot and posts one summary.
    pub async fn daily_report(&self) -> Result<Option<ReportSummary>> {
        let state = self.store.load().await?;
        let Some(current) = state.current_count.and_then(NonZeroU64::new) else {
            return Ok(None);
        };

        let summary = ReportSummary::classify(state.last_daily_count, current);
        self.store.put::<LastDailyCount>(current.get()).await?;
        self.notifier.post_message(&summary.to_string()).await?;

        tracing::info!(count = current.get(), delta = %summary.delta(), "Daily report posted");
        Ok(Some(summary))
    }
}
