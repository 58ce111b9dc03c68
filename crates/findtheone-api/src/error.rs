//! Error types for backend API operations.

use serde::Deserialize;

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of an error body returned by the backend.
///
/// The backend reports business failures as `{ "error": "<kind>", "message": "..." }`
/// with a non-2xx status. Only two kinds carry meaning for the client; everything
/// else is treated alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The viewer does not have enough coins for the operation.
    InsufficientCoins,
    /// The request referenced something the server no longer accepts
    /// (missing message, message not addressed to the viewer, ...).
    InvalidRequest,
    /// Any other reported failure.
    Other,
}

impl ApiErrorKind {
    /// Classifies the `error` field of a backend error body.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "insufficient coins" => Self::InsufficientCoins,
            "invalid request" => Self::InvalidRequest,
            _ => Self::Other,
        }
    }
}

/// API error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP transport error (connect, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The backend rejected the request with an error body.
    #[error("API error ({status}): {code} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error code from the body (e.g., `insufficient coins`).
        code: String,
        /// Human-readable description.
        message: String,
    },

    /// The bearer credential was missing, expired, or rejected.
    #[error("Authentication required")]
    Unauthorized,

    /// The bearer token could not be decoded.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Creates an API error from a status, error code, and description.
    #[must_use]
    pub fn api(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Returns the classification of this error.
    ///
    /// Transport and decoding failures are always [`ApiErrorKind::Other`].
    #[must_use]
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::Api { code, .. } => ApiErrorKind::from_code(code),
            _ => ApiErrorKind::Other,
        }
    }
}

/// Error body returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    /// Error code.
    pub error: String,
    /// Error description.
    #[serde(default)]
    pub message: String,
}

impl ErrorBody {
    /// Converts to an Error for the given status.
    ///
    /// Bodies that are not JSON (the backend sometimes answers with a bare
    /// string) become an error with an empty code and the raw text as message.
    pub(crate) fn into_error(status: u16, raw: &str) -> Error {
        match serde_json::from_str::<Self>(raw) {
            Ok(body) => Error::api(status, body.error, body.message),
            Err(_) => Error::api(status, "", raw.trim()),
        }
    }
}
