//! Wire types for the backend REST API.
//!
//! Records are decoded from the backend's camelCase JSON and exposed with
//! flat, snake_case fields. Fields the client never reads are ignored.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Server-assigned user identifier.
    UserId
);
id_type!(
    /// Server-assigned message identifier.
    MessageId
);
id_type!(
    /// Identifier of a match record (distinct from the matched user's id).
    MatchId
);

/// A chat message as reported by the server.
///
/// `is_unlocked` is reported from the viewer's perspective: `Some(true)` once
/// the viewer has paid to reveal a received message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireMessage", into = "WireMessage")]
pub struct Message {
    /// Message id.
    pub id: MessageId,
    /// Author of the message.
    pub sender_id: UserId,
    /// Addressee of the message.
    pub receiver_id: UserId,
    /// Text payload; only meaningful once the message is visible.
    pub content: String,
    /// Server timestamp (local time, no offset).
    pub sent_at: NaiveDateTime,
    /// Whether the viewer has unlocked this message. Absent means no.
    pub is_unlocked: Option<bool>,
    /// Whether the receiver has read this message.
    pub is_read: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ParticipantRef {
    id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    id: MessageId,
    sender: ParticipantRef,
    receiver: ParticipantRef,
    #[serde(default)]
    content: Option<String>,
    sent_at: NaiveDateTime,
    #[serde(default)]
    is_unlocked: Option<bool>,
    #[serde(default)]
    is_read: Option<bool>,
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        Self {
            id: wire.id,
            sender_id: wire.sender.id,
            receiver_id: wire.receiver.id,
            content: wire.content.unwrap_or_default(),
            sent_at: wire.sent_at,
            is_unlocked: wire.is_unlocked,
            is_read: wire.is_read,
        }
    }
}

impl From<Message> for WireMessage {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            sender: ParticipantRef {
                id: message.sender_id,
            },
            receiver: ParticipantRef {
                id: message.receiver_id,
            },
            content: Some(message.content),
            sent_at: message.sent_at,
            is_unlocked: message.is_unlocked,
            is_read: message.is_read,
        }
    }
}

/// Public profile of another user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// User id.
    pub id: UserId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Age in years.
    #[serde(default)]
    pub age: Option<u32>,
    /// Free-form bio.
    #[serde(default)]
    pub bio: Option<String>,
    /// Location text.
    #[serde(default)]
    pub location: Option<String>,
    /// Profile photo URL.
    #[serde(default)]
    pub profile_photo_url: Option<String>,
    /// Gender as reported by the server.
    #[serde(default)]
    pub gender: Option<String>,
    /// Comma-separated interests.
    #[serde(default)]
    pub interests: Option<String>,
}

/// A mutual match with another user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireMatch")]
pub struct MatchSummary {
    /// Match record id, used for navigation.
    pub match_id: MatchId,
    /// The other participant. Conversations are keyed by `profile.id`.
    pub profile: Profile,
    /// When the match was created.
    pub matched_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMatch {
    match_id: MatchId,
    user_id: UserId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    profile_photo_url: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    interests: Option<String>,
    #[serde(default)]
    matched_at: Option<NaiveDateTime>,
}

impl From<WireMatch> for MatchSummary {
    fn from(wire: WireMatch) -> Self {
        Self {
            match_id: wire.match_id,
            profile: Profile {
                id: wire.user_id,
                name: wire.name,
                age: wire.age,
                bio: wire.bio,
                location: wire.location,
                profile_photo_url: wire.profile_photo_url,
                gender: wire.gender,
                interests: wire.interests,
            },
            matched_at: wire.matched_at,
        }
    }
}

/// Response of `GET /payment/coins`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CoinBalance {
    /// Current balance.
    pub coins: u32,
}

/// A purchasable coin package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoinPackage {
    /// Package identifier (e.g., `starter`).
    pub id: String,
    /// Coins granted.
    pub coins: u32,
    /// Bonus coins on top of `coins`.
    pub bonus: u32,
    /// Price in the store currency.
    pub price: f64,
    /// Whether the store highlights this package.
    pub popular: bool,
}

impl CoinPackage {
    /// Total coins credited by this package.
    #[must_use]
    pub const fn total_coins(&self) -> u32 {
        self.coins.saturating_add(self.bonus)
    }

    /// Price of a single coin, bonus included.
    #[must_use]
    pub fn price_per_coin(&self) -> Option<f64> {
        match self.total_coins() {
            0 => None,
            total => Some(self.price / f64::from(total)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PackageTerms {
    coins: u32,
    #[serde(default)]
    bonus: u32,
    price: f64,
    #[serde(default)]
    popular: bool,
}

/// Converts the `{ id: terms }` catalogue into packages ordered by size.
pub(crate) fn packages_from_catalogue(catalogue: HashMap<String, PackageTerms>) -> Vec<CoinPackage> {
    let mut packages: Vec<CoinPackage> = catalogue
        .into_iter()
        .map(|(id, terms)| CoinPackage {
            id,
            coins: terms.coins,
            bonus: terms.bonus,
            price: terms.price,
            popular: terms.popular,
        })
        .collect();
    packages.sort_by(|a, b| a.coins.cmp(&b.coins).then_with(|| a.id.cmp(&b.id)));
    packages
}

/// Request body of `POST /payment/purchase`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PurchaseRequest<'a> {
    pub package: &'a str,
}

/// Transaction details attached to a purchase receipt.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction id.
    pub id: i64,
    /// Coins credited.
    pub coin_amount: u32,
    /// Amount charged.
    pub money_amount: f64,
    /// Payment processor reference.
    #[serde(default)]
    pub payment_id: Option<String>,
}

/// Response of `POST /payment/purchase`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    /// Whether the purchase went through.
    pub success: bool,
    /// Human-readable status.
    #[serde(default)]
    pub message: String,
    /// Authoritative balance after the purchase.
    #[serde(default)]
    pub new_coin_balance: Option<u32>,
    /// Transaction details.
    #[serde(default)]
    pub transaction: Option<Transaction>,
}

/// Kind of a chat message. Only text is sent by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    /// Plain text.
    #[default]
    Text,
}

/// Request body of `POST /messages/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    /// Addressee.
    pub receiver_id: UserId,
    /// Text payload.
    pub content: String,
    /// Message kind.
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

impl OutgoingMessage {
    /// Creates a text message.
    #[must_use]
    pub fn text(receiver_id: UserId, content: impl Into<String>) -> Self {
        Self {
            receiver_id,
            content: content.into(),
            kind: MessageKind::Text,
        }
    }
}

/// Request body of `POST /messages/unlock`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UnlockRequest {
    pub message_id: MessageId,
}

/// Successful response of `POST /messages/unlock`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockReceipt {
    /// Human-readable status.
    #[serde(default)]
    pub message: Option<String>,
    /// The message had been unlocked before; no coin was charged.
    #[serde(default)]
    pub already_unlocked: bool,
}

/// Discovery action on a suggested profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeAction {
    /// Express interest.
    Like,
    /// Skip the profile.
    Pass,
}

impl SwipeAction {
    /// Path segment of the matching endpoint for this action.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Pass => "dislike",
        }
    }
}

/// Response of a like/dislike call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeReceipt {
    /// Human-readable status.
    #[serde(default)]
    pub message: String,
    /// The like completed a mutual match.
    #[serde(default)]
    pub is_match: bool,
}

/// Request body of `POST /auth/signin`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SigninRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `POST /auth/signin`.
#[derive(Debug, Clone, Deserialize)]
pub struct SigninResponse {
    /// Bearer token.
    #[serde(alias = "accessToken", alias = "jwt")]
    pub token: String,
    /// Signed-in user id.
    pub id: UserId,
    /// Signed-in email.
    #[serde(default)]
    pub email: String,
    /// Signed-in display name.
    #[serde(default)]
    pub name: String,
}
