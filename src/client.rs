//! `WaveClient` for the Bradford White Wave API
//!
//! The client owns one [`Session`] (connection pool, cookie jar, tokens) and
//! runs one logical flow at a time: every call that may touch the tokens takes
//! `&mut self`, so no locking is involved.
//!
//! # Token lifecycle
//!
//! ```text
//!  refresh_token ──► authenticate() ──► access_token ──► request()
//!                         ▲                                 │
//!                         └──────── 401 (once) ─────────────┘
//! ```
//!
//! - An access token is obtained lazily on the first request.
//! - A 401 triggers exactly one refresh and one retry of the same request.
//! - The refresh token may rotate; read it back with [`WaveClient::refresh_token`]
//!   and persist it yourself.
//!
//! # Example
//!
//! ```no_run
//! use bradford_white_wave::{ViewType, WaveClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = WaveClient::new("stored-refresh-token")?;
//!
//! for device in client.list_devices().await? {
//!     let status = client.get_status(&device.mac_address).await?;
//!     println!("{}: {:?}°F", status.friendly_name, status.setpoint_fahrenheit);
//!
//!     let usage = client.get_energy_usage(&device.mac_address, ViewType::Hourly).await?;
//!     println!("{} energy records", usage.len());
//! }
//!
//! client.close();
//! # Ok(())
//! # }
//! ```

use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use typed_builder::TypedBuilder;

use crate::auth::{AuthConfig, Session, TokenSet, WaveAuth, account_id_from_token};
use crate::error::{Result, WaveError};
use crate::types::{DeviceMode, DeviceStatus, EnergyUsage, ViewType, WriteResponse};
use crate::utils::body_snippet;

/// Production API gateway
pub const DEFAULT_BASE_URL: &str = "https://gw.prdapi.bradfordwhiteapps.com";

const ENDPOINT_LIST_DEVICES: &str = "/wave/getApplianceList";
const ENDPOINT_GET_STATUS: &str = "/wave/getApplianceStatus";
const ENDPOINT_GET_ENERGY: &str = "/wave/getEnergyUsage";
const ENDPOINT_SET_TEMP: &str = "/wave/changeSetpoint";
const ENDPOINT_SET_MODE: &str = "/wave/changeOpMode";

/// Client configuration
#[derive(Debug, Clone, TypedBuilder)]
#[builder(
    builder_method(doc = "Create a new builder for ClientConfig"),
    builder_type(doc = "Builder for ClientConfig", vis = "pub"),
    build_method(doc = "Build the ClientConfig")
)]
pub struct ClientConfig {
    /// API gateway base URL
    #[builder(default = DEFAULT_BASE_URL.to_string(), setter(into))]
    pub base_url: String,

    /// Per-request timeout on the transport
    #[builder(default = Some(Duration::from_secs(30)), setter(strip_option))]
    pub timeout: Option<Duration>,

    /// Identity provider settings
    #[builder(default)]
    pub auth: AuthConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Email and password for the scripted login
#[derive(Clone)]
struct Credentials {
    email: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Client for the Wave API
#[derive(Debug)]
pub struct WaveClient {
    config: ClientConfig,
    auth: WaveAuth,
    session: Session,
    credentials: Option<Credentials>,
}

impl WaveClient {
    /// Create a client from a stored refresh token with the default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(refresh_token: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::default(), refresh_token)
    }

    /// Create a client from a stored refresh token
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_config(config: ClientConfig, refresh_token: impl Into<String>) -> Result<Self> {
        let mut client = Self::build(config)?;
        client.session.set_refresh_token(refresh_token);
        Ok(client)
    }

    /// Create a client that logs in with email and password on first use
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_credentials(
        config: ClientConfig,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let mut client = Self::build(config)?;
        client.credentials = Some(Credentials {
            email: email.into(),
            password: password.into(),
        });
        Ok(client)
    }

    /// Create a client from a token set the caller already holds
    ///
    /// # Errors
    ///
    /// Returns [`WaveError::Auth`] if the token set has no access token.
    pub fn from_tokens(config: ClientConfig, tokens: &TokenSet) -> Result<Self> {
        let mut client = Self::build(config)?;
        client.session.apply(tokens)?;
        Ok(client)
    }

    fn build(config: ClientConfig) -> Result<Self> {
        let session = Session::new(&config.auth, config.timeout)?;
        let auth = WaveAuth::with_client(config.auth.clone(), session.http().clone());
        Ok(Self {
            config,
            auth,
            session,
            credentials: None,
        })
    }

    /// Get the client configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The identity provider client sharing this client's session
    #[must_use]
    pub fn auth(&self) -> &WaveAuth {
        &self.auth
    }

    /// Current access token, if authenticated
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.session.access_token()
    }

    /// Current refresh token (persist this after calls, it may have rotated)
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.session.refresh_token()
    }

    /// Obtain an access token.
    ///
    /// Uses the refresh token when one is present; otherwise runs the scripted
    /// login if the client was built with credentials.
    ///
    /// # Errors
    ///
    /// Returns [`WaveError::Auth`] if there is nothing to authenticate with or
    /// the identity provider rejects the attempt.
    pub async fn authenticate(&mut self) -> Result<()> {
        let tokens = if let Some(refresh_token) = self.session.refresh_token() {
            self.auth.refresh_tokens(refresh_token).await?
        } else if let Some(credentials) = &self.credentials {
            tracing::debug!(email = %credentials.email, "Logging in with credentials");
            self.auth
                .authenticate(&credentials.email, &credentials.password)
                .await?
        } else {
            return Err(WaveError::auth(
                "No refresh token available. Open the authorization URL, log in, and exchange \
                 the redirect code for tokens first (e.g. `wave-cli auth-url` then `wave-cli exchange`)",
            ));
        };

        self.session.apply(&tokens)?;
        tracing::debug!("Authenticated with Wave API");
        Ok(())
    }

    /// Send an authenticated request and decode the JSON response.
    ///
    /// A 401 causes one token refresh and one retry; whatever the retry returns
    /// is final.
    ///
    /// # Errors
    ///
    /// Returns [`WaveError::Connect`] on a non-success status (including a second
    /// 401) or a failed refresh, and transport/JSON errors as they occur.
    pub async fn request(
        &mut self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.ensure_access_token().await?;

        let response = self.send(&method, path, query, body).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::decode(response, path).await;
        }

        tracing::warn!(path, "Access token rejected, refreshing and retrying once");
        self.session.invalidate_access_token();
        self.reauthenticate().await?;

        let retry = self.send(&method, path, query, body).await?;
        Self::decode(retry, path).await
    }

    /// List the water heaters on the account
    ///
    /// # Errors
    ///
    /// Returns [`WaveError::Auth`] if the account id cannot be read from the
    /// access token, or any error from [`Self::request`].
    pub async fn list_devices(&mut self) -> Result<Vec<DeviceStatus>> {
        self.ensure_access_token().await?;
        let token = self
            .session
            .access_token()
            .ok_or_else(|| WaveError::auth("No access token after authentication"))?;
        let account_id = account_id_from_token(token)?;

        let response = self
            .request(
                Method::GET,
                ENDPOINT_LIST_DEVICES,
                Some(&[("userId", account_id.as_str())]),
                None,
            )
            .await?;

        let devices = unwrap_list(response, "appliances", ENDPOINT_LIST_DEVICES)?;
        tracing::debug!(count = devices.len(), "Listed appliances");
        Ok(devices)
    }

    /// Fetch the live status of one heater
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::request`] or a decode error.
    pub async fn get_status(&mut self, mac_address: &str) -> Result<DeviceStatus> {
        let body = json!({ "macAddress": mac_address });
        let response = self
            .request(Method::POST, ENDPOINT_GET_STATUS, None, Some(&body))
            .await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Fetch energy usage records, in the order the API returns them
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::request`] or a decode error.
    pub async fn get_energy_usage(
        &mut self,
        mac_address: &str,
        view_type: ViewType,
    ) -> Result<Vec<EnergyUsage>> {
        // This endpoint takes snake_case keys
        let body = json!({ "mac_address": mac_address, "view_type": view_type.as_str() });
        let response = self
            .request(Method::POST, ENDPOINT_GET_ENERGY, None, Some(&body))
            .await?;
        unwrap_list(response, "data", ENDPOINT_GET_ENERGY)
    }

    /// Change the setpoint, in °F
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::request`] or a decode error.
    pub async fn set_temperature(
        &mut self,
        mac_address: &str,
        temperature: i64,
    ) -> Result<WriteResponse> {
        let body = json!({ "macAddress": mac_address, "setpoint": temperature });
        let response = self
            .request(Method::POST, ENDPOINT_SET_TEMP, None, Some(&body))
            .await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Change the operating mode
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::request`] or a decode error.
    pub async fn set_mode(
        &mut self,
        mac_address: &str,
        mode: impl Into<DeviceMode>,
    ) -> Result<WriteResponse> {
        let body = json!({ "macAddress": mac_address, "heatMode": mode.into() });
        let response = self
            .request(Method::POST, ENDPOINT_SET_MODE, None, Some(&body))
            .await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Release the session and its connection pool
    pub fn close(self) {
        tracing::debug!("Closing Wave client");
        drop(self);
    }

    async fn ensure_access_token(&mut self) -> Result<()> {
        if self.session.needs_refresh() {
            self.authenticate().await?;
        }
        Ok(())
    }

    /// Refresh after a rejected token; failures here are reported as connection errors
    async fn reauthenticate(&mut self) -> Result<()> {
        self.authenticate().await.map_err(|e| {
            tracing::warn!(error = %e, "Token refresh after 401 failed");
            match e {
                WaveError::Auth(msg) => WaveError::connect(format!("Token refresh failed: {msg}")),
                other => other,
            }
        })
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        let token = self
            .session
            .access_token()
            .ok_or_else(|| WaveError::auth("Not authenticated"))?;
        let url = format!("{}{path}", self.config.base_url.trim_end_matches('/'));

        let mut request = self
            .session
            .http()
            .request(method.clone(), url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json");
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, path, "Wave API request");
        Ok(request.send().await?)
    }

    async fn decode(response: reqwest::Response, path: &str) -> Result<Value> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(WaveError::connect(format!(
                "API request to {path} failed (status {}): {}",
                status.as_u16(),
                body_snippet(&body)
            )));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Accept either a bare JSON array or an object wrapping it under `key`
fn unwrap_list<T: serde::de::DeserializeOwned>(value: Value, key: &str, path: &str) -> Result<Vec<T>> {
    let list = match value {
        Value::Array(_) => value,
        Value::Null => return Ok(Vec::new()),
        Value::Object(mut map) => map.remove(key).ok_or_else(|| {
            WaveError::connect(format!("Unexpected response from {path}: no '{key}' list"))
        })?,
        other => {
            return Err(WaveError::connect(format!(
                "Unexpected response from {path}: {}",
                body_snippet(&other.to_string())
            )));
        }
    };
    Ok(serde_json::from_value(list)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MacAddress;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.auth.redirect_uri, AuthConfig::default().redirect_uri);
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::builder()
            .base_url("http://localhost:8080")
            .timeout(Duration::from_secs(5))
            .build();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_new_client_holds_refresh_token_only() {
        let client = WaveClient::new("refresh-abc").unwrap();
        assert_eq!(client.refresh_token(), Some("refresh-abc"));
        assert_eq!(client.access_token(), None);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let client =
            WaveClient::from_credentials(ClientConfig::default(), "me@example.com", "hunter2")
                .unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("me@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_unwrap_list_shapes() {
        let bare: Vec<MacAddress> = unwrap_list(json!(["a", "b"]), "appliances", "/x").unwrap();
        assert_eq!(bare.len(), 2);

        let wrapped: Vec<MacAddress> =
            unwrap_list(json!({"appliances": ["a"]}), "appliances", "/x").unwrap();
        assert_eq!(wrapped[0], "a");

        let empty: Vec<MacAddress> = unwrap_list(Value::Null, "appliances", "/x").unwrap();
        assert!(empty.is_empty());

        let err = unwrap_list::<MacAddress>(json!({"other": []}), "appliances", "/x").unwrap_err();
        assert!(err.to_string().contains("appliances"));

        assert!(unwrap_list::<MacAddress>(json!(42), "appliances", "/x").is_err());
    }

    #[test]
    fn test_close_consumes_client() {
        let client = WaveClient::new("refresh-abc").unwrap();
        let shared = client.auth().clone();
        client.close();
        assert_eq!(shared.config().client_id, AuthConfig::default().client_id);
    }

    #[tokio::test]
    async fn test_authenticate_without_refresh_token_fails() {
        let mut client = WaveClient::build(ClientConfig::default()).unwrap();
        let err = client.authenticate().await.unwrap_err();
        assert!(err.is_auth());
        assert!(err.to_string().contains("authorization URL"));
    }
}
