//! Error types for the core library.

use thiserror::Error;

use findtheone_api::{MatchId, UserId};

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Backend request failed.
    #[error("API error: {0}")]
    Api(#[from] findtheone_api::Error),

    /// An operation needed an active conversation and none is selected.
    #[error("No conversation is selected")]
    NoActiveConversation,

    /// The match id is not among the viewer's loaded matches.
    #[error("Unknown match: {0}")]
    UnknownMatch(MatchId),

    /// A message with no text after trimming.
    #[error("Message is empty")]
    EmptyMessage,

    /// The backend declined a purchase without an error status.
    #[error("Purchase declined: {0}")]
    PurchaseDeclined(String),

    /// A purchase is already in flight.
    #[error("A purchase is already in progress")]
    PurchaseInProgress,

    /// The session was closed; the operation was not performed.
    #[error("Session for viewer {0} is closed")]
    SessionClosed(UserId),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
