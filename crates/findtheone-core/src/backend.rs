//! The seam between client state and the network.
//!
//! Every component in this crate talks to the server through [`Backend`].
//! [`ApiClient`] is the production implementation; tests substitute an
//! in-memory double.

use std::future::Future;

use findtheone_api::{
    ApiClient, CoinPackage, MatchSummary, Message, MessageId, OutgoingMessage, Profile,
    PurchaseReceipt, SwipeAction, SwipeReceipt, UnlockReceipt, UserId,
};

/// Result type for backend calls.
pub type BackendResult<T> = findtheone_api::Result<T>;

/// Server operations consumed by the client core.
pub trait Backend: Send + Sync {
    /// `GET /matching/matches`.
    fn matches(&self) -> impl Future<Output = BackendResult<Vec<MatchSummary>>> + Send;

    /// `GET /matching/suggestions`.
    fn suggestions(&self) -> impl Future<Output = BackendResult<Vec<Profile>>> + Send;

    /// `POST /matching/{like|dislike}/{user}`.
    fn swipe(
        &self,
        action: SwipeAction,
        user_id: UserId,
    ) -> impl Future<Output = BackendResult<SwipeReceipt>> + Send;

    /// `GET /payment/coins`.
    fn coins(&self) -> impl Future<Output = BackendResult<u32>> + Send;

    /// `GET /payment/packages`.
    fn packages(&self) -> impl Future<Output = BackendResult<Vec<CoinPackage>>> + Send;

    /// `POST /payment/purchase`.
    fn purchase(&self, package: &str) -> impl Future<Output = BackendResult<PurchaseReceipt>> + Send;

    /// `GET /messages/conversation/{other}`.
    fn conversation(
        &self,
        other_user: UserId,
    ) -> impl Future<Output = BackendResult<Vec<Message>>> + Send;

    /// `POST /messages/send`.
    fn send_message(
        &self,
        message: &OutgoingMessage,
    ) -> impl Future<Output = BackendResult<()>> + Send;

    /// `POST /messages/unlock`.
    fn unlock(&self, message_id: MessageId)
    -> impl Future<Output = BackendResult<UnlockReceipt>> + Send;
}

impl Backend for ApiClient {
    fn matches(&self) -> impl Future<Output = BackendResult<Vec<MatchSummary>>> + Send {
        Self::matches(self)
    }

    fn suggestions(&self) -> impl Future<Output = BackendResult<Vec<Profile>>> + Send {
        Self::suggestions(self)
    }

    fn swipe(
        &self,
        action: SwipeAction,
        user_id: UserId,
    ) -> impl Future<Output = BackendResult<SwipeReceipt>> + Send {
        Self::swipe(self, action, user_id)
    }

    fn coins(&self) -> impl Future<Output = BackendResult<u32>> + Send {
        Self::coins(self)
    }

    fn packages(&self) -> impl Future<Output = BackendResult<Vec<CoinPackage>>> + Send {
        Self::packages(self)
    }

    fn purchase(&self, package: &str) -> impl Future<Output = BackendResult<PurchaseReceipt>> + Send {
        Self::purchase(self, package)
    }

    fn conversation(
        &self,
        other_user: UserId,
    ) -> impl Future<Output = BackendResult<Vec<Message>>> + Send {
        Self::conversation(self, other_user)
    }

    fn send_message(
        &self,
        message: &OutgoingMessage,
    ) -> impl Future<Output = BackendResult<()>> + Send {
        Self::send_message(self, message)
    }

    fn unlock(
        &self,
        message_id: MessageId,
    ) -> impl Future<Output = BackendResult<UnlockReceipt>> + Send {
        Self::unlock(self, message_id)
    }
}
