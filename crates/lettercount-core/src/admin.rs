//! Operator overrides.
//!
//! An authorized operator can restart the sequence at any number. The reset
//! stores the number *before* the replacement and clears the last counter,
//! so the very next submission must be the replacement itself and may come
//! from anyone.

use crate::codec;
use crate::state::StatePatch;
use std::collections::HashSet;
use std::num::NonZeroU64;
use thiserror::Error;

/// A reset request from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCommand {
    /// Who issued the command
    pub operator: String,
    /// Command argument, the replacement count as letters
    pub text: String,
}

/// Why an override was refused. The message is shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverrideRejected {
    #[error("You don't have permission to reset the count.")]
    PermissionDenied,

    #[error("Couldn't decode that. Give the next number in lowercase letters, like `abc`.")]
    Decode,
}

/// The configured set of operators.
#[derive(Debug, Clone, Default)]
pub struct Operators {
    ids: HashSet<String>,
}

impl Operators {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A validated reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    /// Next count that will be accepted
    pub next: NonZeroU64,
    /// Replacement exactly as the operator typed it (trimmed)
    pub token: String,
}

impl Override {
    /// Check authorization and parse the replacement.
    pub fn authorize(operators: &Operators, command: &AdminCommand) -> Result<Self, OverrideRejected> {
        if !operators.contains(&command.operator) {
            return Err(OverrideRejected::PermissionDenied);
        }

        let token = command.text.trim();
        let next = codec::decode(token)
            .ok()
            .and_then(NonZeroU64::new)
            .ok_or(OverrideRejected::Decode)?;

        Ok(Self {
            next,
            token: token.to_string(),
        })
    }

    /// The state change: count one below the replacement, nobody blocked.
    pub fn patch(&self) -> StatePatch {
        StatePatch::new()
            .current_count(self.next.get() - 1)
            .clear_last_counter()
    }

    /// Public announcement of the reset.
    pub fn announcement(&self, operator: &str) -> String {
        format!("<@{}> reset the count. The next number is {}.", operator, self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operators() -> Operators {
        Operators::new(["UADMIN"])
    }

    fn command(operator: &str, text: &str) -> AdminCommand {
        AdminCommand {
            operator: operator.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn unknown_operator_denied() {
        assert_eq!(
            Override::authorize(&operators(), &command("U1", "z")),
            Err(OverrideRejected::PermissionDenied)
        );
    }

    #[test]
    fn permission_checked_before_decoding() {
        assert_eq!(
            Override::authorize(&operators(), &command("U1", "42")),
            Err(OverrideRejected::PermissionDenied)
        );
    }

    #[test]
    fn malformed_token_rejected() {
        for text in ["", "   ", "Z", "12", "ab c"] {
            assert_eq!(
                Override::authorize(&operators(), &command("UADMIN", text)),
                Err(OverrideRejected::Decode),
                "text = {:?}",
                text
            );
        }
    }

    #[test]
    fn reset_patch() {
        let reset = Override::authorize(&operators(), &command("UADMIN", " z ")).unwrap();
        assert_eq!(reset.next.get(), 26);
        assert_eq!(reset.token, "z");
        assert_eq!(
            reset.patch(),
            StatePatch::new().current_count(25).clear_last_counter()
        );
    }

    #[test]
    fn reset_to_one_stores_zero() {
        let reset = Override::authorize(&operators(), &command("UADMIN", "a")).unwrap();
        assert_eq!(reset.patch().current_count, Some(0));
    }

    #[test]
    fn announcement_names_operator_and_text() {
        let reset = Override::authorize(&operators(), &command("UADMIN", "abc")).unwrap();
        let text = reset.announcement("UADMIN");
        assert!(text.contains("UADMIN"));
        assert!(text.contains("abc"));
    }

    #[test]
    fn operators_set() {
        let ops = Operators::new(vec!["U1".to_string(), "U2".to_string(), "U1".to_string()]);
        assert!(ops.contains("U1") && ops.contains("U2"));
        assert!(!ops.is_empty());
        assert!(Operators::default().is_empty());
    }
}
