//! Bearer credentials and token inspection.
//!
//! The backend issues JWTs. The client never verifies signatures; it only
//! reads the payload to learn the viewer id and the expiry so requests are not
//! sent with a token the server is certain to reject.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::UserId;

/// Claims read from a token payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject; a user id on some deployments, an email on others.
    #[serde(default)]
    pub sub: Option<serde_json::Value>,
    /// Explicit user id claim.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Alternative user id claim.
    #[serde(default)]
    pub id: Option<i64>,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    /// Decodes the payload segment of a JWT.
    ///
    /// # Errors
    ///
    /// Returns an error if the token does not have three segments or the
    /// payload is not base64url-encoded JSON.
    pub fn decode(token: &str) -> Result<Self> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => return Err(Error::InvalidToken("expected three segments".into())),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| Error::InvalidToken(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Viewer id carried by the token: numeric `sub`, then `userId`, then `id`.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        let subject = match &self.sub {
            Some(serde_json::Value::Number(n)) => n.as_i64(),
            Some(serde_json::Value::String(s)) => s.parse().ok(),
            _ => None,
        };
        subject
            .or(self.user_id)
            .or(self.id)
            .map(UserId)
    }

    /// Expiry instant, if the token carries one.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Bearer credential attached to every authenticated request.
#[derive(Clone)]
pub struct Credentials {
    token: String,
    claims: Option<Claims>,
}

impl Credentials {
    /// Wraps a bearer token.
    ///
    /// Tokens whose payload cannot be decoded are still accepted; the server
    /// remains the judge of validity.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into().trim().to_string();
        let claims = Claims::decode(&token).ok();
        Self { token, claims }
    }

    /// Raw token for the `Authorization` header.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Decoded claims, when the token is a readable JWT.
    #[must_use]
    pub const fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    /// Viewer id carried by the token.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.claims.as_ref().and_then(Claims::user_id)
    }

    /// Checks whether the token is known to be expired.
    ///
    /// A token without a readable `exp` claim is never considered expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.claims
            .as_ref()
            .and_then(Claims::expires_at)
            .is_some_and(|exp| Utc::now() >= exp)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("claims", &self.claims)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn jwt(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_numeric_subject() {
        let creds = Credentials::new(jwt(r#"{"sub":"42","exp":4102444800}"#));
        assert_eq!(creds.user_id(), Some(UserId(42)));
        assert!(!creds.is_expired());
    }

    #[test]
    fn test_email_subject_falls_back_to_user_id() {
        let creds = Credentials::new(jwt(r#"{"sub":"ana@example.com","userId":7}"#));
        assert_eq!(creds.user_id(), Some(UserId(7)));
    }

    #[test]
    fn test_numeric_subject_number() {
        let creds = Credentials::new(jwt(r#"{"sub":42}"#));
        assert_eq!(creds.user_id(), Some(UserId(42)));
    }

    #[test]
    fn test_expired_token() {
        let creds = Credentials::new(jwt(r#"{"sub":"1","exp":946684800}"#));
        assert!(creds.is_expired());
    }

    #[test]
    fn test_opaque_token() {
        let creds = Credentials::new("  opaque-token ");
        assert_eq!(creds.token(), "opaque-token");
        assert!(creds.claims().is_none());
        assert!(creds.user_id().is_none());
        assert!(!creds.is_expired());
    }

    #[test]
    fn test_decode_rejects_two_segments() {
        assert!(matches!(
            Claims::decode("a.b"),
            Err(Error::InvalidToken(_))
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let creds = Credentials::new("secret-token");
        assert!(!format!("{creds:?}").contains("secret-token"));
    }
}
