//! Request ordering tokens.
//!
//! Reloads of the same resource may overlap: a slow reload started by an
//! unlock can finish after a newer reload started by a send. Each reload
//! takes a token before it suspends; its response is applied only if the
//! token is still the latest one issued for that resource.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Opaque ordering token for one outstanding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(u64);

impl Token {
    /// Returns the raw sequence number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Outcome of a reload whose response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    /// The response was the latest and replaced local state.
    Applied {
        /// Number of records now held.
        items: usize,
    },
    /// A newer request, a conversation switch, or teardown made the response
    /// stale; local state was left untouched.
    Superseded,
}

impl Reload {
    /// Whether the response replaced local state.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Issues monotonically increasing tokens for one resource.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
    closed: AtomicBool,
}

impl RequestSequencer {
    /// Creates a sequencer with no tokens issued.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Issues a token that supersedes every earlier one.
    pub fn issue(&self) -> Token {
        Token(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether a response carrying `token` may still be applied.
    #[must_use]
    pub fn is_current(&self, token: Token) -> bool {
        !self.closed.load(Ordering::Acquire) && self.latest.load(Ordering::Acquire) == token.0
    }

    /// Makes every outstanding token stale without issuing a new request.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }

    /// Permanently rejects all tokens, outstanding and future.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Whether [`Self::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_increase() {
        let seq = RequestSequencer::new();
        let a = seq.issue();
        let b = seq.issue();
        assert!(b > a);
        assert_eq!(a.value() + 1, b.value());
    }

    #[test]
    fn test_only_latest_is_current() {
        let seq = RequestSequencer::new();
        let first = seq.issue();
        assert!(seq.is_current(first));

        let second = seq.issue();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn test_invalidate() {
        let seq = RequestSequencer::new();
        let token = seq.issue();
        seq.invalidate();
        assert!(!seq.is_current(token));

        let next = seq.issue();
        assert!(seq.is_current(next));
    }

    #[test]
    fn test_close_rejects_everything() {
        let seq = RequestSequencer::new();
        let token = seq.issue();
        seq.close();
        assert!(seq.is_closed());
        assert!(!seq.is_current(token));
        assert!(!seq.is_current(seq.issue()));
    }

    #[test]
    fn test_reload_is_applied() {
        assert!(Reload::Applied { items: 0 }.is_applied());
        assert!(!Reload::Superseded.is_applied());
    }
}
