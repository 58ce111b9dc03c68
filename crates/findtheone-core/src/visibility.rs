//! Message visibility from the viewer's perspective.
//!
//! Visibility is a pure function of the message record and the viewer. It is
//! recomputed on every query and never cached by message id, because
//! `is_unlocked` changes on reload while the id stays the same.

use findtheone_api::{Message, UserId};

use crate::ledger::Balance;

/// Coins charged to reveal one received message.
pub const UNLOCK_COST: u32 = 1;

/// How a message should be presented to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Content is shown.
    Visible,
    /// An unlock request for this message is in flight.
    Pending,
    /// Locked; the cached balance covers the unlock cost.
    Unlockable,
    /// Locked; the cached balance does not cover the unlock cost or is unknown.
    Locked,
}

impl Visibility {
    /// Whether the content may be rendered.
    #[must_use]
    pub const fn shows_content(self) -> bool {
        matches!(self, Self::Visible)
    }
}

/// Whether the viewer authored the message.
#[must_use]
pub fn is_sent_by(message: &Message, viewer: UserId) -> bool {
    message.sender_id == viewer
}

/// Whether the message content is visible to the viewer.
///
/// Own messages are always visible; received messages only once unlocked.
#[must_use]
pub fn is_visible(message: &Message, viewer: UserId) -> bool {
    is_sent_by(message, viewer) || message.is_unlocked.unwrap_or(false)
}

/// Resolves the presentation state of a message.
///
/// `balance` and `in_flight` only drive affordances; the server remains the
/// authority on whether an unlock succeeds.
#[must_use]
pub fn resolve(message: &Message, viewer: UserId, balance: Balance, in_flight: bool) -> Visibility {
    if is_visible(message, viewer) {
        Visibility::Visible
    } else if in_flight {
        Visibility::Pending
    } else if balance.covers(UNLOCK_COST) {
        Visibility::Unlockable
    } else {
        Visibility::Locked
    }
}
