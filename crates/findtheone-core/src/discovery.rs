//! Swipe deck of suggested profiles.
//!
//! Profiles are consumed in server order. The cursor moves only after the
//! server has recorded the like or pass, so a failed swipe leaves the same
//! profile on top to retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use findtheone_api::{Profile, SwipeAction};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::lock;
use crate::sequence::{Reload, RequestSequencer};
use crate::Result;

/// Result of one swipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwipeResult {
    /// The server recorded the action and the deck advanced.
    Recorded {
        /// The profile that was swiped.
        profile: Profile,
        /// What was done to it.
        action: SwipeAction,
        /// The like completed a mutual match.
        is_match: bool,
    },
    /// The request failed; the profile stays on top.
    Failed,
    /// No profile left to swipe.
    Exhausted,
    /// Another swipe is still in flight.
    Busy,
}

#[derive(Debug, Default)]
struct DeckState {
    profiles: Vec<Profile>,
    cursor: usize,
    /// Bumped on every applied refresh.
    generation: u64,
}

/// Resets the busy flag when a swipe ends.
struct SwipeGuard<'a>(&'a AtomicBool);

impl Drop for SwipeGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Queue of suggested profiles with a read cursor.
#[derive(Debug)]
pub struct DiscoveryDeck<B> {
    backend: Arc<B>,
    state: Mutex<DeckState>,
    refreshes: RequestSequencer,
    swiping: AtomicBool,
}

impl<B: Backend> DiscoveryDeck<B> {
    /// Creates an empty deck.
    #[must_use]
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: Mutex::new(DeckState::default()),
            refreshes: RequestSequencer::new(),
            swiping: AtomicBool::new(false),
        }
    }

    /// Fetches suggestions, replaces the queue, and rewinds the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; the deck is left unchanged.
    pub async fn refresh(&self) -> Result<Reload> {
        let token = self.refreshes.issue();
        let profiles = self.backend.suggestions().await?;

        let mut state = lock(&self.state);
        if !self.refreshes.is_current(token) {
            return Ok(Reload::Superseded);
        }
        let items = profiles.len();
        state.profiles = profiles;
        state.cursor = 0;
        state.generation += 1;
        drop(state);

        debug!("Loaded {items} suggested profiles");
        Ok(Reload::Applied { items })
    }

    /// The profile on top of the deck.
    #[must_use]
    pub fn current(&self) -> Option<Profile> {
        let state = lock(&self.state);
        state.profiles.get(state.cursor).cloned()
    }

    /// Profiles not yet swiped, including the current one.
    #[must_use]
    pub fn remaining(&self) -> usize {
        let state = lock(&self.state);
        state.profiles.len().saturating_sub(state.cursor)
    }

    /// Whether every loaded profile has been swiped.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Likes or passes on the current profile.
    ///
    /// Only one swipe runs at a time; a call made while another is pending
    /// returns [`SwipeResult::Busy`] without a request. If a refresh lands
    /// while the swipe is in flight, the new deck is not advanced.
    pub async fn swipe(&self, action: SwipeAction) -> SwipeResult {
        if self.swiping.swap(true, Ordering::AcqRel) {
            return SwipeResult::Busy;
        }
        let _guard = SwipeGuard(&self.swiping);

        let (profile, generation) = {
            let state = lock(&self.state);
            match state.profiles.get(state.cursor) {
                Some(profile) => (profile.clone(), state.generation),
                None => return SwipeResult::Exhausted,
            }
        };

        match self.backend.swipe(action, profile.id).await {
            Ok(receipt) => {
                let mut state = lock(&self.state);
                if state.generation == generation {
                    state.cursor += 1;
                }
                drop(state);

                if receipt.is_match {
                    info!("Matched with {} ({})", profile.name, profile.id);
                } else {
                    debug!("Recorded {action:?} on user {}", profile.id);
                }
                SwipeResult::Recorded {
                    profile,
                    action,
                    is_match: receipt.is_match,
                }
            }
            Err(e) => {
                warn!("Failed to record {action:?} on user {}: {e}", profile.id);
                SwipeResult::Failed
            }
        }
    }

    /// Stops applying refresh responses.
    pub fn close(&self) {
        self.refreshes.close();
    }
}
