//! One viewer's chat screen.
//!
//! A [`ChatSession`] ties the match list, the active conversation, the coin
//! ledger, and the unlock coordinator together and turns unlock outcomes
//! into the refreshes that bring local state back in line with the server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use findtheone_api::{MatchId, MatchSummary, Message, MessageId, UserId};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::conversation::ConversationStore;
use crate::error::Error;
use crate::ledger::{Balance, CoinLedger};
use crate::lock;
use crate::sequence::{Reload, RequestSequencer};
use crate::unlock::{UnlockCoordinator, UnlockOutcome};
use crate::visibility::{self, Visibility};
use crate::Result;

/// Chat state for one authenticated viewer.
#[derive(Debug)]
pub struct ChatSession<B> {
    viewer: UserId,
    backend: Arc<B>,
    matches: Mutex<Vec<MatchSummary>>,
    match_loads: RequestSequencer,
    ledger: CoinLedger<B>,
    conversation: ConversationStore<B>,
    unlocks: UnlockCoordinator<B>,
    purchase_prompt: AtomicBool,
    closed: AtomicBool,
}

impl<B: Backend> ChatSession<B> {
    /// Creates a session for `viewer`. Nothing is fetched until [`Self::open`].
    #[must_use]
    pub fn new(backend: Arc<B>, viewer: UserId) -> Self {
        Self {
            viewer,
            matches: Mutex::new(Vec::new()),
            match_loads: RequestSequencer::new(),
            ledger: CoinLedger::new(Arc::clone(&backend)),
            conversation: ConversationStore::new(Arc::clone(&backend)),
            unlocks: UnlockCoordinator::new(Arc::clone(&backend)),
            backend,
            purchase_prompt: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// The authenticated user.
    #[must_use]
    pub const fn viewer(&self) -> UserId {
        self.viewer
    }

    /// The coin ledger shared by this session.
    #[must_use]
    pub const fn ledger(&self) -> &CoinLedger<B> {
        &self.ledger
    }

    /// The active conversation.
    #[must_use]
    pub const fn conversation(&self) -> &ConversationStore<B> {
        &self.conversation
    }

    /// The unlock coordinator.
    #[must_use]
    pub const fn unlocks(&self) -> &UnlockCoordinator<B> {
        &self.unlocks
    }

    /// Loads the match list and the initial coin balance.
    ///
    /// A failed balance fetch is logged and leaves the balance
    /// [`Balance::Unknown`].
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed or the match list cannot be
    /// fetched.
    pub async fn open(&self) -> Result<()> {
        self.ensure_open()?;
        let (matches, balance) = tokio::join!(self.reload_matches(), self.ledger.refresh_balance());
        if let Err(e) = balance {
            warn!("Failed to load coin balance: {e}");
        }
        matches?;
        info!(
            "Chat opened for user {} with {} matches, balance {}",
            self.viewer,
            self.matches().len(),
            self.balance()
        );
        Ok(())
    }

    /// Fetches the match list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; the previous list is kept.
    pub async fn reload_matches(&self) -> Result<Reload> {
        let token = self.match_loads.issue();
        let matches = self.backend.matches().await?;

        let mut current = lock(&self.matches);
        if !self.match_loads.is_current(token) {
            return Ok(Reload::Superseded);
        }
        let items = matches.len();
        *current = matches;
        Ok(Reload::Applied { items })
    }

    /// Snapshot of the loaded matches.
    #[must_use]
    pub fn matches(&self) -> Vec<MatchSummary> {
        lock(&self.matches).clone()
    }

    /// The match whose conversation is active.
    #[must_use]
    pub fn active_match(&self) -> Option<MatchSummary> {
        let other = self.conversation.active()?;
        lock(&self.matches)
            .iter()
            .find(|m| m.profile.id == other)
            .cloned()
    }

    /// Opens the conversation with a loaded match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMatch`] if the id is not in the match list,
    /// or an error if the conversation cannot be fetched.
    pub async fn select_match(&self, match_id: MatchId) -> Result<Reload> {
        self.ensure_open()?;
        let other = lock(&self.matches)
            .iter()
            .find(|m| m.match_id == match_id)
            .map(|m| m.profile.id)
            .ok_or(Error::UnknownMatch(match_id))?;

        debug!("Selecting match {match_id} (user {other})");
        self.conversation.load_conversation(other).await
    }

    /// Messages of the active conversation with their presentation state.
    #[must_use]
    pub fn timeline(&self) -> Vec<(Message, Visibility)> {
        self.conversation
            .messages()
            .into_iter()
            .map(|message| {
                let visibility = self.visibility(&message);
                (message, visibility)
            })
            .collect()
    }

    /// Presentation state of `message` for this viewer, derived on every call.
    #[must_use]
    pub fn visibility(&self, message: &Message) -> Visibility {
        visibility::resolve(
            message,
            self.viewer,
            self.ledger.balance(),
            self.unlocks.is_in_flight(message.id),
        )
    }

    /// The cached coin balance.
    #[must_use]
    pub fn balance(&self) -> Balance {
        self.ledger.balance()
    }

    /// Sends a text message to the active conversation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveConversation`] if no match is selected,
    /// [`Error::EmptyMessage`] for blank content, or an error if the send
    /// request fails.
    pub async fn send(&self, content: &str) -> Result<()> {
        self.ensure_open()?;
        let receiver = self.conversation.active().ok_or(Error::NoActiveConversation)?;
        self.conversation.send_message(receiver, content).await
    }

    /// Unlocks a received message and reconciles local state.
    ///
    /// A message that is already visible settles immediately without a
    /// request. Follow-up refreshes run once per request, in the call that
    /// dispatched it:
    ///
    /// - unlocked: reload the conversation and refresh the balance together;
    /// - insufficient coins: raise the purchase prompt;
    /// - invalid request: reload the conversation;
    /// - anything else: nothing beyond the log entry.
    pub async fn unlock(&self, message_id: MessageId) -> UnlockOutcome {
        if self.is_closed() {
            return UnlockOutcome::Cancelled;
        }
        if let Some(message) = self.conversation.message(message_id)
            && visibility::is_visible(&message, self.viewer)
        {
            return UnlockOutcome::Unlocked {
                already_unlocked: true,
            };
        }

        let settled = self.unlocks.request_unlock(message_id).await;
        if !settled.is_leader() || self.is_closed() {
            return settled.outcome;
        }

        match settled.outcome {
            UnlockOutcome::Unlocked { .. } => {
                tokio::join!(self.reload_conversation(), self.refresh_balance());
            }
            UnlockOutcome::InsufficientCoins => {
                debug!("Raising purchase prompt after unlock of message {message_id}");
                self.purchase_prompt.store(true, Ordering::Release);
            }
            UnlockOutcome::InvalidRequest => self.reload_conversation().await,
            UnlockOutcome::Failed | UnlockOutcome::Cancelled => {}
        }
        settled.outcome
    }

    /// Whether the "buy coins" prompt should be shown.
    #[must_use]
    pub fn purchase_prompt(&self) -> bool {
        self.purchase_prompt.load(Ordering::Acquire)
    }

    /// Hides the "buy coins" prompt.
    pub fn dismiss_purchase_prompt(&self) {
        self.purchase_prompt.store(false, Ordering::Release);
    }

    /// Tears the session down. Responses arriving later are discarded.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.match_loads.close();
        self.conversation.close();
        self.ledger.close();
        debug!("Chat closed for user {}", self.viewer);
    }

    /// Whether [`Self::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::SessionClosed(self.viewer));
        }
        Ok(())
    }

    async fn reload_conversation(&self) {
        if self.conversation.active().is_none() {
            return;
        }
        if let Err(e) = self.conversation.reload().await {
            warn!("Failed to reload conversation: {e}");
        }
    }

    async fn refresh_balance(&self) {
        if let Err(e) = self.ledger.refresh_balance().await {
            warn!("Failed to refresh coin balance: {e}");
        }
    }
}
