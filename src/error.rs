//! Error types for the Bradford White Wave client

use thiserror::Error;

/// Main error type for the Wave client
#[derive(Error, Debug)]
pub enum WaveError {
    /// Authentication error (login flow, token exchange, redirect parsing, missing tokens)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Non-success response from the Wave API, or a failed token refresh during a call
    #[error("Connection error: {0}")]
    Connect(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON decode error when parsing API responses
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for Wave client operations
pub type Result<T> = std::result::Result<T, WaveError>;

impl WaveError {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a connection error
    pub fn connect(msg: impl Into<String>) -> Self {
        Self::Connect(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether this error came out of the authentication layer
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
