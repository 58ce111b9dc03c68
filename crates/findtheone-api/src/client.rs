//! HTTP client for the backend REST API.

use std::collections::HashMap;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::Credentials;
use crate::config::ApiConfig;
use crate::error::{Error, ErrorBody, Result};
use crate::types::{
    CoinBalance, CoinPackage, MatchSummary, Message, MessageId, OutgoingMessage, PackageTerms,
    Profile, PurchaseReceipt, PurchaseRequest, SigninRequest, SigninResponse, SwipeAction,
    SwipeReceipt, UnlockReceipt, UnlockRequest, UserId, packages_from_catalogue,
};

/// Client for the backend REST API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ApiConfig,
    credentials: Option<Credentials>,
    http_client: Client,
}

impl ApiClient {
    /// Creates a client without credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            config,
            credentials: None,
            http_client,
        })
    }

    /// Attaches bearer credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Returns the attached credentials.
    #[must_use]
    pub const fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Signs in with email and password.
    ///
    /// The returned token is not attached; use [`Self::with_credentials`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credentials are rejected.
    pub async fn signin(&self, email: &str, password: &str) -> Result<SigninResponse> {
        let url = self.config.endpoint("auth/signin")?;
        let request = self
            .http_client
            .post(url)
            .json(&SigninRequest { email, password });
        let response = check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Lists the viewer's matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn matches(&self) -> Result<Vec<MatchSummary>> {
        self.get_json("matching/matches").await
    }

    /// Lists profiles the viewer has not yet acted on.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn suggestions(&self) -> Result<Vec<Profile>> {
        self.get_json("matching/suggestions").await
    }

    /// Records a like or pass on a suggested profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn swipe(&self, action: SwipeAction, user_id: UserId) -> Result<SwipeReceipt> {
        let path = format!("matching/{}/{user_id}", action.path_segment());
        self.post_json(&path, &serde_json::json!({})).await
    }

    /// Fetches the viewer's coin balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn coins(&self) -> Result<u32> {
        let balance: CoinBalance = self.get_json("payment/coins").await?;
        Ok(balance.coins)
    }

    /// Fetches the coin package catalogue, smallest package first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn packages(&self) -> Result<Vec<CoinPackage>> {
        let catalogue: HashMap<String, PackageTerms> = self.get_json("payment/packages").await?;
        Ok(packages_from_catalogue(catalogue))
    }

    /// Purchases a coin package.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the package is rejected.
    pub async fn purchase(&self, package: &str) -> Result<PurchaseReceipt> {
        self.post_json("payment/purchase", &PurchaseRequest { package })
            .await
    }

    /// Fetches the conversation with another user in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn conversation(&self, other_user: UserId) -> Result<Vec<Message>> {
        self.get_json(&format!("messages/conversation/{other_user}"))
            .await
    }

    /// Sends a message. The response body carries no contract beyond success.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<()> {
        let url = self.config.endpoint("messages/send")?;
        let request = self.authorized(self.http_client.post(url))?.json(message);
        check(request.send().await?).await?;
        Ok(())
    }

    /// Spends one coin to reveal a received message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. Business failures surface as
    /// [`Error::Api`]; classify them with [`Error::kind`].
    pub async fn unlock(&self, message_id: MessageId) -> Result<UnlockReceipt> {
        let url = self.config.endpoint("messages/unlock")?;
        let request = self
            .authorized(self.http_client.post(url))?
            .json(&UnlockRequest { message_id });
        let response = check(request.send().await?).await?;

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(UnlockReceipt::default());
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.config.endpoint(path)?;
        debug!("GET {url}");
        let request = self.authorized(self.http_client.get(url))?;
        let response = check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.config.endpoint(path)?;
        debug!("POST {url}");
        let request = self.authorized(self.http_client.post(url))?.json(body);
        let response = check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match &self.credentials {
            Some(credentials) if !credentials.is_expired() => {
                Ok(request.bearer_auth(credentials.token()))
            }
            _ => Err(Error::Unauthorized),
        }
    }
}

/// Turns non-2xx responses into errors.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized);
    }

    let raw = response.text().await.unwrap_or_default();
    debug!("request failed with {status}: {raw}");
    Err(ErrorBody::into_error(status.as_u16(), &raw))
}
