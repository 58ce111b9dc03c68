//! Per-message unlock coordination.
//!
//! At most one unlock request per message is outstanding at any time. The
//! first caller for a message id becomes the leader and talks to the server;
//! callers arriving while it is pending join it and receive the same
//! outcome without a second network call.
//!
//! Errors never escape as `Err`. The server's answer is classified into an
//! [`UnlockOutcome`], and the caller decides which state to refresh.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex};

use findtheone_api::{ApiErrorKind, MessageId};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::lock;

/// Final result of one unlock attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// The server revealed the message.
    Unlocked {
        /// It had been unlocked before and no coin was charged.
        already_unlocked: bool,
    },
    /// The viewer cannot pay for the unlock.
    InsufficientCoins,
    /// The message no longer exists or is not addressed to the viewer.
    InvalidRequest,
    /// Network, server, or unrecognized failure.
    Failed,
    /// The leading request was dropped before it settled.
    Cancelled,
}

impl UnlockOutcome {
    /// Whether the message is now unlocked on the server.
    #[must_use]
    pub const fn is_unlocked(self) -> bool {
        matches!(self, Self::Unlocked { .. })
    }
}

/// How a caller took part in an unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Dispatched the request.
    Leader,
    /// Waited on a request that was already in flight.
    Joined,
}

/// A settled unlock as seen by one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled {
    /// Shared outcome.
    pub outcome: UnlockOutcome,
    /// This caller's part in it.
    pub role: Role,
}

impl Settled {
    /// Whether this caller dispatched the request and owns its follow-ups.
    #[must_use]
    pub const fn is_leader(&self) -> bool {
        matches!(self.role, Role::Leader)
    }
}

type Pending = watch::Receiver<Option<UnlockOutcome>>;

/// Removes the in-flight entry however the leader exits.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashMap<MessageId, Pending>>,
    message_id: MessageId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(self.in_flight).remove(&self.message_id);
    }
}

enum Slot {
    Lead(watch::Sender<Option<UnlockOutcome>>),
    Join(Pending),
}

/// De-duplicates unlock requests per message id.
#[derive(Debug)]
pub struct UnlockCoordinator<B> {
    backend: Arc<B>,
    in_flight: Mutex<HashMap<MessageId, Pending>>,
}

impl<B: Backend> UnlockCoordinator<B> {
    /// Creates a coordinator with nothing in flight.
    #[must_use]
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Whether an unlock for `message_id` is outstanding.
    #[must_use]
    pub fn is_in_flight(&self, message_id: MessageId) -> bool {
        lock(&self.in_flight).contains_key(&message_id)
    }

    /// Number of outstanding unlocks.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// Unlocks a received message.
    ///
    /// If a request for the same id is already outstanding, no request is
    /// sent; this call waits for that one and returns its outcome with
    /// [`Role::Joined`]. The id leaves the in-flight set before the outcome
    /// is published, and also when the leading future is dropped early.
    pub async fn request_unlock(&self, message_id: MessageId) -> Settled {
        let slot = match lock(&self.in_flight).entry(message_id) {
            Entry::Occupied(entry) => Slot::Join(entry.get().clone()),
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(None);
                entry.insert(rx);
                Slot::Lead(tx)
            }
        };

        match slot {
            Slot::Join(rx) => {
                debug!("Unlock of message {message_id} already in flight, joining");
                Settled {
                    outcome: Self::wait(rx).await,
                    role: Role::Joined,
                }
            }
            Slot::Lead(tx) => {
                let guard = InFlightGuard {
                    in_flight: &self.in_flight,
                    message_id,
                };
                debug!("Requesting unlock of message {message_id}");
                let outcome = self.dispatch(message_id).await;

                drop(guard);
                tx.send_replace(Some(outcome));
                Settled {
                    outcome,
                    role: Role::Leader,
                }
            }
        }
    }

    async fn dispatch(&self, message_id: MessageId) -> UnlockOutcome {
        match self.backend.unlock(message_id).await {
            Ok(receipt) => {
                debug!(
                    "Unlocked message {message_id} (already unlocked: {})",
                    receipt.already_unlocked
                );
                UnlockOutcome::Unlocked {
                    already_unlocked: receipt.already_unlocked,
                }
            }
            Err(e) => match e.kind() {
                ApiErrorKind::InsufficientCoins => {
                    debug!("Not enough coins to unlock message {message_id}");
                    UnlockOutcome::InsufficientCoins
                }
                ApiErrorKind::InvalidRequest => {
                    debug!("Unlock of message {message_id} rejected as invalid: {e}");
                    UnlockOutcome::InvalidRequest
                }
                ApiErrorKind::Other => {
                    warn!("Failed to unlock message {message_id}: {e}");
                    UnlockOutcome::Failed
                }
            },
        }
    }

    async fn wait(mut rx: Pending) -> UnlockOutcome {
        rx.wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|outcome| *outcome)
            .unwrap_or(UnlockOutcome::Cancelled)
    }
}
