//! # findtheone-core
//!
//! Client-side state for the `FindTheOne` dating app, independent of any UI.
//!
//! This crate provides:
//! - **Message visibility** - which messages the viewer may read
//! - **Unlock coordination** - one coin-gated unlock request per message
//! - **Coin ledger** - cached, server-authoritative coin balance
//! - **Conversation store** - the active message list with ordered reloads
//! - **Chat session** - the pieces above wired together for one viewer
//! - **Discovery deck** - like/pass over suggested profiles
//! - **Coin store** - package catalogue and purchases
//!
//! All network access goes through the [`Backend`] trait, implemented for
//! [`findtheone_api::ApiClient`].
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use findtheone_api::{ApiClient, ApiConfig, Credentials, MatchId, MessageId, UserId};
//! use findtheone_core::{ChatSession, UnlockOutcome};
//!
//! let client = ApiClient::new(ApiConfig::default())?.with_credentials(Credentials::new(token));
//! let session = ChatSession::new(Arc::new(client), UserId(1));
//! session.open().await?;
//! session.select_match(MatchId(40)).await?;
//!
//! if session.unlock(MessageId(5)).await == UnlockOutcome::InsufficientCoins {
//!     assert!(session.purchase_prompt());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod backend;
pub mod conversation;
pub mod discovery;
mod error;
pub mod ledger;
pub mod sequence;
pub mod session;
pub mod store;
pub mod unlock;
pub mod visibility;

#[cfg(test)]
mod testing;

pub use backend::{Backend, BackendResult};
pub use conversation::ConversationStore;
pub use discovery::{DiscoveryDeck, SwipeResult};
pub use error::{Error, Result};
pub use ledger::{Balance, CoinLedger};
pub use sequence::{Reload, RequestSequencer, Token};
pub use session::ChatSession;
pub use store::CoinStore;
pub use unlock::{Role, Settled, UnlockCoordinator, UnlockOutcome};
pub use visibility::{UNLOCK_COST, Visibility, is_sent_by, is_visible, resolve};

/// Locks a mutex, recovering the data if a previous holder panicked.
///
/// Guarded state here is always left consistent between statements, so a
/// poisoned lock carries no torn data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
