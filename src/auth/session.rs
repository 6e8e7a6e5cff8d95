//! Per-client session state: HTTP connection pool, cookie jar and current tokens

use std::time::Duration;

use super::oauth::AuthConfig;
use super::token::{TokenSet, now_secs};
use crate::error::{Result, WaveError};

/// Seconds before expiry at which an access token is treated as stale
const EXPIRY_SKEW_SECS: u64 = 60;

/// Session owned by a single client instance
///
/// The underlying [`reqwest::Client`] keeps a cookie jar (needed by the hosted
/// login pages) and never follows redirects on its own, so the login flow can
/// read `Location` headers pointing at the app's custom URL scheme.
#[derive(Debug, Clone)]
pub struct Session {
    http: reqwest::Client,
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<u64>,
}

impl Session {
    /// Create a session with a fresh HTTP client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed (TLS backend).
    pub fn new(config: &AuthConfig, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(config.user_agent.as_str());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| WaveError::invalid_config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_http(http))
    }

    /// Create a session around an existing HTTP client
    #[must_use]
    pub fn with_http(http: reqwest::Client) -> Self {
        Self {
            http,
            access_token: None,
            refresh_token: None,
            expires_at: None,
        }
    }

    /// The shared HTTP client
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Current access token
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Current refresh token
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Seed the session with a refresh token obtained elsewhere
    pub fn set_refresh_token(&mut self, refresh_token: impl Into<String>) {
        self.refresh_token = Some(refresh_token.into());
    }

    /// Store tokens from a successful exchange or refresh.
    ///
    /// A refresh response without a `refresh_token` keeps the previous one, so an
    /// access token always stays paired with a refresh token once one was issued.
    ///
    /// # Errors
    ///
    /// Returns [`WaveError::Auth`] if the payload carries no access token.
    pub fn apply(&mut self, tokens: &TokenSet) -> Result<()> {
        let access_token = tokens
            .access_token()
            .ok_or_else(|| WaveError::auth("Token response did not contain an access token"))?;

        self.access_token = Some(access_token.to_string());
        if let Some(refresh_token) = tokens.refresh_token() {
            self.refresh_token = Some(refresh_token.to_string());
        }
        self.expires_at = tokens.expires_in().map(|secs| now_secs().saturating_add(secs));
        Ok(())
    }

    /// Whether the access token is missing or about to expire
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        match (&self.access_token, self.expires_at) {
            (None, _) => true,
            (Some(_), Some(expires_at)) => {
                now_secs().saturating_add(EXPIRY_SKEW_SECS) >= expires_at
            }
            (Some(_), None) => false,
        }
    }

    /// Drop the access token, keeping the refresh token
    pub fn invalidate_access_token(&mut self) {
        self.access_token = None;
        self.expires_at = None;
    }
}
