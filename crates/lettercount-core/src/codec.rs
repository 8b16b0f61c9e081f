//! Letter numerals.
//!
//! Counts are written in bijective base-26 over `a..z`. There is no zero
//! digit: `a` is 1, `z` is 26, `aa` is 27 and `ba` is 53. Every positive
//! integer has exactly one spelling.

use crate::error::{Error, Result};
use std::num::NonZeroU64;

const RADIX: u64 = 26;

/// Encode a positive count as letters.
///
/// Fails with [`Error::InvalidInput`] for zero.
pub fn encode(n: u64) -> Result<String> {
    NonZeroU64::new(n)
        .map(encode_nonzero)
        .ok_or_else(|| Error::InvalidInput("count must be a positive integer".into()))
}

/// Encode a count that is known to be positive.
pub fn encode_nonzero(n: NonZeroU64) -> String {
    let mut n = n.get();
    let mut digits = Vec::new();

    while n > 0 {
        // Shift to a zero-based digit before taking the remainder.
        n -= 1;
        digits.push(b'a' + (n % RADIX) as u8);
        n /= RADIX;
    }

    digits.reverse();
    // Only ASCII lowercase letters were pushed.
    digits.into_iter().map(char::from).collect()
}

/// Decode a run of lowercase letters into a count.
///
/// Fails on empty input, on any character outside `a..z`, and on tokens too
/// long to fit in a `u64`.
pub fn decode(token: &str) -> Result<u64> {
    if token.is_empty() {
        return Err(Error::Decode("empty token".into()));
    }

    token.bytes().try_fold(0u64, |acc, b| {
        if !b.is_ascii_lowercase() {
            return Err(Error::Decode(format!("unexpected character {:?}", char::from(b))));
        }
        let digit = u64::from(b - b'a' + 1);
        acc.checked_mul(RADIX)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| Error::Decode(format!("token too long: {}", token)))
    })
}

/// Pull the count token out of a chat message.
///
/// The message must start (after optional whitespace) with a run of
/// lowercase letters, followed either by the end of the text or by a
/// character that is not an ASCII letter. So `"abc"` and `"abc, nice"` count,
/// but `"Abc"` and `"abC"` do not.
pub fn extract_token(text: &str) -> Option<&str> {
    let rest = text.trim_start();
    let end = rest
        .find(|c: char| !c.is_ascii_lowercase())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }

    match rest[end..].chars().next() {
        Some(next) if next.is_ascii_alphabetic() => None,
        _ => Some(&rest[..end]),
    }
}
