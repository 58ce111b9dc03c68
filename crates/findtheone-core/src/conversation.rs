//! Message list of the active conversation.
//!
//! The store holds at most one conversation, keyed by the other participant.
//! Every reload replaces the list with the server's response in server
//! order; local records are never patched or merged. Sends are not inserted
//! optimistically, the follow-up reload brings them in.

use std::sync::{Arc, Mutex};

use findtheone_api::{Message, MessageId, OutgoingMessage, UserId};
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::error::Error;
use crate::lock;
use crate::sequence::{Reload, RequestSequencer};
use crate::Result;

#[derive(Debug, Default)]
struct ConversationState {
    active: Option<UserId>,
    messages: Vec<Message>,
}

/// Ordered message list for the conversation currently on screen.
#[derive(Debug)]
pub struct ConversationStore<B> {
    backend: Arc<B>,
    state: Mutex<ConversationState>,
    reloads: RequestSequencer,
}

impl<B: Backend> ConversationStore<B> {
    /// Creates an empty store with no active conversation.
    #[must_use]
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: Mutex::new(ConversationState::default()),
            reloads: RequestSequencer::new(),
        }
    }

    /// The other participant of the active conversation.
    #[must_use]
    pub fn active(&self) -> Option<UserId> {
        lock(&self.state).active
    }

    /// Snapshot of the current message list.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.state).messages.clone()
    }

    /// Looks up one message of the active conversation.
    #[must_use]
    pub fn message(&self, id: MessageId) -> Option<Message> {
        lock(&self.state).messages.iter().find(|m| m.id == id).cloned()
    }

    /// Makes `other_user` the active conversation.
    ///
    /// Clears the list and discards every reload still outstanding for the
    /// previous conversation.
    pub fn switch_to(&self, other_user: UserId) {
        let mut state = lock(&self.state);
        self.reloads.invalidate();
        if state.active != Some(other_user) {
            debug!("Switching conversation to user {other_user}");
            state.active = Some(other_user);
            state.messages.clear();
        }
    }

    /// Fetches the conversation with `other_user` and replaces the list.
    ///
    /// Switches to `other_user` first if it is not already active. The
    /// response is dropped if a newer reload was issued or the conversation
    /// changed while it was in flight.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; the list is left as it was.
    pub async fn load_conversation(&self, other_user: UserId) -> Result<Reload> {
        if self.active() != Some(other_user) {
            self.switch_to(other_user);
        }
        let token = self.reloads.issue();
        let messages = self.backend.conversation(other_user).await?;

        let mut state = lock(&self.state);
        if !self.reloads.is_current(token) || state.active != Some(other_user) {
            debug!(
                "Discarding stale conversation response for user {other_user} (token {})",
                token.value()
            );
            return Ok(Reload::Superseded);
        }
        let items = messages.len();
        state.messages = messages;
        drop(state);

        debug!("Loaded {items} messages with user {other_user}");
        Ok(Reload::Applied { items })
    }

    /// Reloads the active conversation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveConversation`] if nothing is selected, or an
    /// error if the request fails.
    pub async fn reload(&self) -> Result<Reload> {
        let other_user = self.active().ok_or(Error::NoActiveConversation)?;
        self.load_conversation(other_user).await
    }

    /// Sends a text message, then reloads to pick it up.
    ///
    /// Content is trimmed. The follow-up reload only runs if `receiver` is
    /// still the active conversation; its failure is logged and the previous
    /// list is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyMessage`] for blank content, or an error if the
    /// send request fails.
    pub async fn send_message(&self, receiver: UserId, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::EmptyMessage);
        }

        self.backend
            .send_message(&OutgoingMessage::text(receiver, content))
            .await?;
        debug!("Sent message to user {receiver}");

        if self.active() == Some(receiver) {
            if let Err(e) = self.load_conversation(receiver).await {
                warn!("Failed to reload conversation with user {receiver} after send: {e}");
            }
        }
        Ok(())
    }

    /// Stops applying responses.
    pub fn close(&self) {
        self.reloads.close();
    }
}
