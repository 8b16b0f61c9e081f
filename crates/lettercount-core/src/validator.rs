//! Submission rules.
//!
//! A submission is valid when it comes from someone other than the last
//! counter and names exactly the next count. The self-succession check runs
//! first, so a correct number from the same person is still refused.

use crate::codec;
use crate::notify::MessageRef;
use std::fmt;
use std::num::NonZeroU64;

/// A chat message that may be a count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Raw message text
    pub text: String,
    /// Who posted it
    pub submitter: String,
    /// Where it was posted
    pub message: MessageRef,
    /// Posted inside a thread
    pub is_thread_reply: bool,
    /// Carries a platform subtype (edits, joins, bot posts, ...)
    pub has_subtype: bool,
}

impl Submission {
    /// Plain top-level messages are the only ones the game looks at.
    pub fn is_plain_message(&self) -> bool {
        !self.is_thread_reply && !self.has_subtype
    }

    /// The decoded count, or `None` if this message isn't a count at all.
    ///
    /// Only the token shape decides whether a message is a count; a
    /// well-shaped token too long for a `u64` is a count that can never be
    /// the next one.
    pub fn candidate(&self) -> Option<Candidate> {
        if !self.is_plain_message() {
            return None;
        }
        let token = codec::extract_token(&self.text)?;
        Some(match codec::decode(token) {
            Ok(count) => Candidate::Count(count),
            Err(_) => Candidate::OutOfRange,
        })
    }
}

/// A decoded count token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    Count(u64),
    /// Letters only, but larger than any storable count
    OutOfRange,
}

/// Why a submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Same person as the last accepted count
    ConsecutiveSubmission,
    /// Not the next number
    WrongNumber { expected: NonZeroU64 },
    /// The count is at the largest storable value
    Exhausted,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ConsecutiveSubmission => {
                write!(f, "You can't count twice in a row, minion.")
            }
            Rejection::WrongNumber { expected } => write!(
                f,
                "That's the wrong number, minion. It should be {}.",
                codec::encode_nonzero(*expected)
            ),
            Rejection::Exhausted => write!(f, "The count can't go any higher, minion."),
        }
    }
}

/// Outcome of checking one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted { count: u64 },
    Rejected(Rejection),
}

/// Check a decoded count against the current state.
///
/// `current` is the last accepted count (zero before the game starts) and
/// `last_counter` the identity that submitted it, `None` when unrestricted.
pub fn validate(
    candidate: Candidate,
    submitter: &str,
    current: u64,
    last_counter: Option<&str>,
) -> Verdict {
    if last_counter == Some(submitter) {
        return Verdict::Rejected(Rejection::ConsecutiveSubmission);
    }

    let Some(expected) = current.checked_add(1).and_then(NonZeroU64::new) else {
        return Verdict::Rejected(Rejection::Exhausted);
    };
    match candidate {
        Candidate::Count(count) if count == expected.get() => Verdict::Accepted { count },
        _ => Verdict::Rejected(Rejection::WrongNumber { expected }),
    }
}
