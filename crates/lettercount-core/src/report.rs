//! Daily progress summary.

use crate::codec::encode_nonzero;
use std::fmt;
use std::num::NonZeroU64;

/// What the daily report says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSummary {
    /// No earlier snapshot to compare with
    FirstReport { current: NonZeroU64 },
    /// Same count as last time
    NoProgress { current: NonZeroU64 },
    /// Count moved (down only after an operator reset)
    Progress {
        previous: NonZeroU64,
        current: NonZeroU64,
    },
}

impl ReportSummary {
    /// Compare the previous snapshot with the current count.
    ///
    /// A zero snapshot is treated as no snapshot.
    pub fn classify(previous: Option<u64>, current: NonZeroU64) -> Self {
        match previous.and_then(NonZeroU64::new) {
            None => ReportSummary::FirstReport { current },
            Some(previous) if previous == current => ReportSummary::NoProgress { current },
            Some(previous) => ReportSummary::Progress { previous, current },
        }
    }

    pub fn current(&self) -> NonZeroU64 {
        match *self {
            ReportSummary::FirstReport { current }
            | ReportSummary::NoProgress { current }
            | ReportSummary::Progress { current, .. } => current,
        }
    }

    /// Signed change since the previous snapshot.
    pub fn delta(&self) -> i128 {
        match *self {
            ReportSummary::Progress { previous, current } => {
                i128::from(current.get()) - i128::from(previous.get())
            }
            _ => 0,
        }
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ReportSummary::FirstReport { current } => write!(
                f,
                "First daily report: we're at {} ({}). Tomorrow's report will show the progress.",
                encode_nonzero(current),
                current
            ),
            ReportSummary::NoProgress { current } => write!(
                f,
                "No progress today. We're still at {} ({}).",
                encode_nonzero(current),
                current
            ),
            ReportSummary::Progress { previous, current } => write!(
                f,
                "Today, we went from {} ({}) to {} ({}). That's a total of {:+}.",
                encode_nonzero(previous),
                previous,
                encode_nonzero(current),
                current,
                self.delta()
            ),
        }
    }
}
