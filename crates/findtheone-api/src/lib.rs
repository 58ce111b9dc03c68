//! # findtheone-api
//!
//! Typed REST client for the FindTheOne dating backend.
//!
//! ## Features
//!
//! - **Configuration**: base URL, timeouts, user agent with a builder
//! - **Credentials**: bearer tokens with JWT payload inspection (viewer id, expiry)
//! - **Endpoints**: matches, suggestions, like/pass, coins, packages, purchase,
//!   conversations, send, unlock
//! - **Error classification**: backend error bodies mapped to [`ApiErrorKind`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use findtheone_api::{ApiClient, ApiConfig, Credentials, UserId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(ApiConfig::new("http://localhost:8091/api")?)?
//!         .with_credentials(Credentials::new("eyJhbGciOi..."));
//!
//!     println!("Coins: {}", client.coins().await?);
//!     for message in client.conversation(UserId(2)).await? {
//!         println!("{}: {}", message.id, message.content);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth;
mod client;
pub mod config;
mod error;
pub mod types;

pub use auth::{Claims, Credentials};
pub use client::ApiClient;
pub use config::{ApiConfig, ApiConfigBuilder};
pub use error::{ApiErrorKind, Error, Result};
pub use types::{
    CoinPackage, MatchId, MatchSummary, Message, MessageId, MessageKind, OutgoingMessage, Profile,
    PurchaseReceipt, SigninResponse, SwipeAction, SwipeReceipt, Transaction, UnlockReceipt, UserId,
};
