//! In-memory backend used by unit tests.
//!
//! Mirrors the server's unlock rules so tests exercise real outcomes rather
//! than canned responses. Individual calls can be held open with gates to
//! interleave requests deterministically.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use chrono::NaiveDate;
use findtheone_api::{
    CoinPackage, Error, MatchId, MatchSummary, Message, MessageId, OutgoingMessage, Profile,
    PurchaseReceipt, SwipeAction, SwipeReceipt, UnlockReceipt, UserId,
};
use tokio::sync::oneshot;

use crate::backend::{Backend, BackendResult};
use crate::lock;

/// Which backend operation a gate or counter refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Matches,
    Coins,
    Conversation,
    Unlock,
    Send,
    Swipe,
    Purchase,
    Suggestions,
}

/// How the mock answers a purchase of a known package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PurchaseReply {
    /// Credit the coins and report the new balance.
    #[default]
    Credit,
    /// Credit the coins but leave the balance out of the receipt.
    CreditWithoutBalance,
    /// Answer `success: false` and credit nothing.
    Decline,
}

#[derive(Debug, Default)]
struct MockState {
    coins: u32,
    fail: HashSet<Op>,
    unlock_failure: Option<(u16, &'static str)>,
    purchase_reply: PurchaseReply,
    matches: Vec<MatchSummary>,
    suggestions: Vec<Profile>,
    conversations: HashMap<UserId, Vec<Message>>,
    packages: Vec<CoinPackage>,
    mutual_likes: HashSet<UserId>,
    swipes: Vec<(SwipeAction, UserId)>,
    calls: HashMap<Op, usize>,
    next_message_id: i64,
}

/// Scriptable in-memory backend.
#[derive(Debug)]
pub struct MockBackend {
    viewer: UserId,
    state: Mutex<MockState>,
    gates: Mutex<HashMap<Op, VecDeque<oneshot::Receiver<()>>>>,
}

pub fn timestamp(minute: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|d| d.and_hms_opt(10, minute, 0))
        .unwrap_or_default()
}

pub fn message(id: i64, sender: i64, receiver: i64, is_unlocked: bool) -> Message {
    Message {
        id: MessageId(id),
        sender_id: UserId(sender),
        receiver_id: UserId(receiver),
        content: format!("message {id}"),
        sent_at: timestamp(u32::try_from(id % 60).unwrap_or_default()),
        is_unlocked: Some(is_unlocked),
        is_read: None,
    }
}

pub fn profile(id: i64, name: &str) -> Profile {
    Profile {
        id: UserId(id),
        name: name.to_string(),
        age: Some(30),
        bio: None,
        location: Some("Lisbon".into()),
        profile_photo_url: None,
        gender: None,
        interests: None,
    }
}

pub fn match_with(match_id: i64, user: i64, name: &str) -> MatchSummary {
    MatchSummary {
        match_id: MatchId(match_id),
        profile: profile(user, name),
        matched_at: Some(timestamp(0)),
    }
}

impl MockBackend {
    /// Creates a backend whose authenticated user is 1.
    pub fn new() -> Self {
        Self::for_viewer(UserId(1))
    }

    pub fn for_viewer(viewer: UserId) -> Self {
        Self {
            viewer,
            state: Mutex::new(MockState {
                next_message_id: 1000,
                ..MockState::default()
            }),
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_coins(self, coins: u32) -> Self {
        lock(&self.state).coins = coins;
        self
    }

    pub fn with_matches(self, matches: Vec<MatchSummary>) -> Self {
        lock(&self.state).matches = matches;
        self
    }

    pub fn with_suggestions(self, suggestions: Vec<Profile>) -> Self {
        lock(&self.state).suggestions = suggestions;
        self
    }

    pub fn with_conversation(self, other: UserId, messages: Vec<Message>) -> Self {
        lock(&self.state).conversations.insert(other, messages);
        self
    }

    pub fn with_packages(self, packages: Vec<CoinPackage>) -> Self {
        lock(&self.state).packages = packages;
        self
    }

    pub fn with_mutual_like(self, user: UserId) -> Self {
        lock(&self.state).mutual_likes.insert(user);
        self
    }

    pub fn fail(&self, op: Op, failing: bool) {
        let mut state = lock(&self.state);
        if failing {
            state.fail.insert(op);
        } else {
            state.fail.remove(&op);
        }
    }

    pub fn fail_coins(&self, failing: bool) {
        self.fail(Op::Coins, failing);
    }

    /// Makes unlock answer with the given status and error code.
    pub fn fail_unlock_with(&self, status: u16, code: &'static str) {
        lock(&self.state).unlock_failure = Some((status, code));
    }

    pub fn reply_to_purchases(&self, reply: PurchaseReply) {
        lock(&self.state).purchase_reply = reply;
    }

    pub fn set_matches(&self, matches: Vec<MatchSummary>) {
        lock(&self.state).matches = matches;
    }

    pub fn set_coins(&self, coins: u32) {
        lock(&self.state).coins = coins;
    }

    pub fn set_suggestions(&self, suggestions: Vec<Profile>) {
        lock(&self.state).suggestions = suggestions;
    }

    pub fn push_message(&self, other: UserId, message: Message) {
        lock(&self.state)
            .conversations
            .entry(other)
            .or_default()
            .push(message);
    }

    pub fn remove_message(&self, id: MessageId) {
        for messages in lock(&self.state).conversations.values_mut() {
            messages.retain(|m| m.id != id);
        }
    }

    pub fn coins(&self) -> u32 {
        lock(&self.state).coins
    }

    pub fn calls(&self, op: Op) -> usize {
        lock(&self.state).calls.get(&op).copied().unwrap_or(0)
    }

    pub fn swipes(&self) -> Vec<(SwipeAction, UserId)> {
        lock(&self.state).swipes.clone()
    }

    /// Holds the next call of `op` open until the returned sender fires.
    pub fn gate(&self, op: Op) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        lock(&self.gates).entry(op).or_default().push_back(rx);
        tx
    }

    pub fn gate_coins(&self) -> oneshot::Sender<()> {
        self.gate(Op::Coins)
    }

    /// Counts the call and reports whether it should fail.
    fn enter(&self, op: Op) -> bool {
        let mut state = lock(&self.state);
        *state.calls.entry(op).or_default() += 1;
        state.fail.contains(&op)
    }

    async fn wait(&self, op: Op) {
        let gate = lock(&self.gates).get_mut(&op).and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }

    fn server_error() -> Error {
        Error::api(500, "", "boom")
    }

    fn unlock_now(&self, message_id: MessageId) -> BackendResult<UnlockReceipt> {
        let mut state = lock(&self.state);
        if let Some((status, code)) = state.unlock_failure {
            return Err(Error::api(status, code, "scripted failure"));
        }

        let coins = state.coins;
        let viewer = self.viewer;
        let Some(message) = state
            .conversations
            .values_mut()
            .flat_map(|messages| messages.iter_mut())
            .find(|m| m.id == message_id)
        else {
            return Err(Error::api(400, "invalid request", "Message not found"));
        };

        if message.sender_id == viewer || message.receiver_id != viewer {
            return Err(Error::api(400, "invalid request", "Access denied"));
        }
        if message.is_unlocked == Some(true) {
            return Ok(UnlockReceipt {
                message: Some("Message already unlocked".into()),
                already_unlocked: true,
            });
        }
        if coins == 0 {
            return Err(Error::api(400, "insufficient coins", "Need 1 coin"));
        }

        message.is_unlocked = Some(true);
        state.coins -= 1;
        Ok(UnlockReceipt {
            message: Some("Message unlocked".into()),
            already_unlocked: false,
        })
    }
}

impl Backend for MockBackend {
    async fn matches(&self) -> BackendResult<Vec<MatchSummary>> {
        let failing = self.enter(Op::Matches);
        let snapshot = lock(&self.state).matches.clone();
        self.wait(Op::Matches).await;
        if failing {
            return Err(Self::server_error());
        }
        Ok(snapshot)
    }

    async fn suggestions(&self) -> BackendResult<Vec<Profile>> {
        let failing = self.enter(Op::Suggestions);
        let snapshot = lock(&self.state).suggestions.clone();
        self.wait(Op::Suggestions).await;
        if failing {
            return Err(Self::server_error());
        }
        Ok(snapshot)
    }

    async fn swipe(&self, action: SwipeAction, user_id: UserId) -> BackendResult<SwipeReceipt> {
        let failing = self.enter(Op::Swipe);
        self.wait(Op::Swipe).await;
        if failing {
            return Err(Self::server_error());
        }
        let mut state = lock(&self.state);
        state.swipes.push((action, user_id));
        let is_match = action == SwipeAction::Like && state.mutual_likes.contains(&user_id);
        Ok(SwipeReceipt {
            message: if is_match { "It's a match!" } else { "Like sent" }.into(),
            is_match,
        })
    }

    async fn coins(&self) -> BackendResult<u32> {
        let failing = self.enter(Op::Coins);
        let snapshot = lock(&self.state).coins;
        self.wait(Op::Coins).await;
        if failing {
            return Err(Self::server_error());
        }
        Ok(snapshot)
    }

    async fn packages(&self) -> BackendResult<Vec<CoinPackage>> {
        Ok(lock(&self.state).packages.clone())
    }

    async fn purchase(&self, package: &str) -> BackendResult<PurchaseReceipt> {
        let failing = self.enter(Op::Purchase);
        self.wait(Op::Purchase).await;
        if failing {
            return Err(Self::server_error());
        }
        let mut state = lock(&self.state);
        let Some(total) = state
            .packages
            .iter()
            .find(|p| p.id == package)
            .map(CoinPackage::total_coins)
        else {
            return Err(Error::api(400, "Invalid package type", ""));
        };
        let reply = state.purchase_reply;
        if reply == PurchaseReply::Decline {
            return Ok(PurchaseReceipt {
                success: false,
                message: "Payment declined".into(),
                new_coin_balance: None,
                transaction: None,
            });
        }
        state.coins += total;
        Ok(PurchaseReceipt {
            success: true,
            message: "Purchase successful!".into(),
            new_coin_balance: (reply == PurchaseReply::Credit).then_some(state.coins),
            transaction: None,
        })
    }

    async fn conversation(&self, other_user: UserId) -> BackendResult<Vec<Message>> {
        let failing = self.enter(Op::Conversation);
        let snapshot = lock(&self.state)
            .conversations
            .get(&other_user)
            .cloned()
            .unwrap_or_default();
        self.wait(Op::Conversation).await;
        if failing {
            return Err(Self::server_error());
        }
        Ok(snapshot)
    }

    async fn send_message(&self, outgoing: &OutgoingMessage) -> BackendResult<()> {
        let failing = self.enter(Op::Send);
        self.wait(Op::Send).await;
        if failing {
            return Err(Self::server_error());
        }
        let mut state = lock(&self.state);
        state.next_message_id += 1;
        let id = state.next_message_id;
        let sent = Message {
            id: MessageId(id),
            sender_id: self.viewer,
            receiver_id: outgoing.receiver_id,
            content: outgoing.content.clone(),
            sent_at: timestamp(59),
            is_unlocked: Some(false),
            is_read: Some(false),
        };
        state
            .conversations
            .entry(outgoing.receiver_id)
            .or_default()
            .push(sent);
        Ok(())
    }

    async fn unlock(&self, message_id: MessageId) -> BackendResult<UnlockReceipt> {
        let failing = self.enter(Op::Unlock);
        self.wait(Op::Unlock).await;
        if failing {
            return Err(Self::server_error());
        }
        self.unlock_now(message_id)
    }
}
