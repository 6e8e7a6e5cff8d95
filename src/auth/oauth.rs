//! Azure AD B2C authorization-code flow for the Bradford White consumer tenant

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use regex::Regex;
use reqwest::header::LOCATION;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;
use url::form_urlencoded;

use super::token::TokenSet;
use crate::error::{Result, WaveError};
use crate::utils::{body_snippet, redact};

// Bradford White mobile app registration
const DEFAULT_CLIENT_ID: &str = "7899415d-1c23-46d8-8a79-4c15ed5f7f22";
const DEFAULT_AUTHORITY: &str =
    "https://consumer.bradfordwhiteapps.com/bradfordwhiteappsb2c.onmicrosoft.com/B2C_1A_SignIn";
const DEFAULT_POLICY: &str = "B2C_1A_SignIn";
const DEFAULT_REDIRECT_URI: &str = "com.bradfordwhiteapps.bwconnect://oauth/redirect";
const DEFAULT_SCOPES: [&str; 4] = ["openid", "email", "offline_access", "profile"];
const DEFAULT_USER_AGENT: &str = "Dart/3.8 (dart:io)";

/// Matches the `var SETTINGS = {...};` blob the B2C login page embeds in a script tag
static SETTINGS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)var\s+SETTINGS\s*=\s*(\{.*?\});").expect("SETTINGS pattern is valid")
});

/// Identity provider configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// OAuth client ID of the mobile app
    pub client_id: String,
    /// B2C policy base URL (`https://<host>/<tenant>/<policy>`)
    pub authority: String,
    /// B2C policy name, sent as `p` to the login endpoints
    pub policy: String,
    /// Registered redirect URI (custom app scheme)
    pub redirect_uri: String,
    /// Scopes to request
    pub scopes: Vec<String>,
    /// User agent presented to the identity provider and the API
    pub user_agent: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            authority: DEFAULT_AUTHORITY.to_string(),
            policy: DEFAULT_POLICY.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl AuthConfig {
    /// Authorization endpoint
    #[must_use]
    pub fn authorize_url(&self) -> String {
        format!("{}/oauth2/v2.0/authorize", self.authority.trim_end_matches('/'))
    }

    /// Token endpoint
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority.trim_end_matches('/'))
    }

    /// Space-joined scope string
    #[must_use]
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }

    fn self_asserted_url(&self) -> String {
        format!("{}/SelfAsserted", self.authority.trim_end_matches('/'))
    }

    fn confirmed_url(&self) -> String {
        format!(
            "{}/api/CombinedSigninAndSignup/confirmed",
            self.authority.trim_end_matches('/')
        )
    }
}

/// Stages of the scripted login, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    /// Nothing sent yet
    Start,
    /// Login page fetched, CSRF token and transaction id read
    PageFetched,
    /// Credentials accepted by the self-asserted endpoint
    CredentialsSubmitted,
    /// Redirect to the app scheme obtained
    RedirectObtained,
    /// Authorization code read from the redirect
    CodeExtracted,
    /// Code exchanged for tokens
    TokensObtained,
}

impl fmt::Display for LoginStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::PageFetched => "page_fetched",
            Self::CredentialsSubmitted => "credentials_submitted",
            Self::RedirectObtained => "redirect_obtained",
            Self::CodeExtracted => "code_extracted",
            Self::TokensObtained => "tokens_obtained",
        };
        f.write_str(name)
    }
}

/// Fields read from the login page's embedded `SETTINGS` object
#[derive(Debug, Deserialize)]
struct LoginSettings {
    #[serde(default)]
    csrf: Option<String>,
    #[serde(default, rename = "transId")]
    trans_id: Option<String>,
}

/// Anti-forgery values needed to submit credentials
#[derive(Debug, Clone, PartialEq, Eq)]
struct LoginPage {
    csrf: String,
    trans_id: String,
}

/// Body returned by the self-asserted credentials endpoint
#[derive(Debug, Deserialize)]
struct SelfAssertedResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the identity provider
#[derive(Debug, Clone)]
pub struct WaveAuth {
    config: AuthConfig,
    http: reqwest::Client,
}

impl WaveAuth {
    /// Create an auth client with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self> {
        Self::with_config(AuthConfig::default())
    }

    /// Create an auth client with its own cookie-keeping, non-redirecting HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_config(config: AuthConfig) -> Result<Self> {
        let session = super::Session::new(&config, None)?;
        Ok(Self::with_client(config, session.http().clone()))
    }

    /// Create an auth client over an existing HTTP client.
    ///
    /// The client must keep cookies and must not follow redirects for the
    /// scripted login to work; [`super::Session::new`] builds one like that.
    #[must_use]
    pub fn with_client(config: AuthConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Get the identity provider configuration
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Build the authorization request URL.
    ///
    /// Parameters are always emitted in the same order and form-encoded.
    #[must_use]
    pub fn generate_auth_url(&self, state: &str, nonce: &str) -> String {
        let scope = self.config.scope();
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &scope)
            .append_pair("state", state)
            .append_pair("nonce", nonce)
            .finish();

        format!("{}?{query}", self.config.authorize_url())
    }

    /// Pull the authorization code out of whatever the user pasted.
    ///
    /// Accepts the full app-scheme redirect URL or the bare code. The
    /// intermediate `confirmed` page URL is rejected because the code only
    /// appears on the hop after it.
    ///
    /// # Errors
    ///
    /// Returns [`WaveError::Auth`] for the `confirmed` URL, for empty input, or
    /// when the URL has no `code` parameter.
    pub fn parse_redirect_url(input: &str) -> Result<String> {
        let input = input.trim();

        if input.contains("confirmed") {
            return Err(WaveError::auth(
                "That is the intermediate 'confirmed' page URL. Supply the URL it redirects to \
                 (starting with the app scheme, e.g. com.bradfordwhiteapps.bwconnect://)",
            ));
        }
        if input.is_empty() {
            return Err(WaveError::auth("Redirect URL or authorization code is empty"));
        }
        if !input.contains("://") {
            return Ok(input.to_string());
        }

        let params = redirect_params(input);
        if let Some((_, code)) = params.iter().find(|(k, v)| k == "code" && !v.is_empty()) {
            return Ok(code.clone());
        }

        let provider_error = params.iter().find(|(k, _)| k == "error").map(|(_, error)| {
            match params.iter().find(|(k, _)| k == "error_description") {
                Some((_, desc)) => format!("{error}: {desc}"),
                None => error.clone(),
            }
        });
        Err(WaveError::auth(match provider_error {
            Some(e) => format!("No 'code' parameter found in redirect URL (provider error: {e})"),
            None => "No 'code' parameter found in redirect URL".to_string(),
        }))
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns [`WaveError::Auth`] if the token endpoint does not answer with a
    /// success status or returns something other than JSON.
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<TokenSet> {
        tracing::debug!(code = %redact(code), "Exchanging authorization code for tokens");
        let scope = self.config.scope();
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("scope", scope.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        self.token_request(&form, "Token exchange failed").await
    }

    /// Obtain a fresh token set from a refresh token.
    ///
    /// The endpoint's JSON payload is returned unmodified.
    ///
    /// # Errors
    ///
    /// Returns [`WaveError::Auth`] if the token endpoint rejects the refresh.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenSet> {
        tracing::debug!("Refreshing tokens");
        let scope = self.config.scope();
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("scope", scope.as_str()),
            ("refresh_token", refresh_token),
        ];
        self.token_request(&form, "Token refresh failed").await
    }

    /// Log in with email and password by driving the hosted B2C login page.
    ///
    /// Runs [`LoginStage`]s strictly in order; the first failure ends the
    /// attempt. Nothing is retried here.
    ///
    /// # Errors
    ///
    /// Returns [`WaveError::Auth`] naming the stage that failed.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<TokenSet> {
        tracing::debug!(stage = %LoginStage::Start, "B2C login");
        let auth_url = self.generate_auth_url(&generate_state(), &generate_state());

        let page = self.fetch_login_page(&auth_url).await?;
        tracing::debug!(stage = %LoginStage::PageFetched, "B2C login");

        self.submit_credentials(&page, email, password).await?;
        tracing::debug!(stage = %LoginStage::CredentialsSubmitted, "B2C login");

        let redirect = self.follow_confirmation(&page, &auth_url).await?;
        tracing::debug!(stage = %LoginStage::RedirectObtained, "B2C login");

        let code = Self::parse_redirect_url(&redirect)?;
        tracing::debug!(stage = %LoginStage::CodeExtracted, "B2C login");

        let tokens = self.exchange_code_for_token(&code).await?;
        tracing::debug!(stage = %LoginStage::TokensObtained, "B2C login");
        Ok(tokens)
    }

    async fn token_request(&self, form: &[(&str, &str)], failure: &str) -> Result<TokenSet> {
        let response = self
            .http
            .post(self.config.token_url())
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(WaveError::auth(format!(
                "{failure} (status {}): {}",
                status.as_u16(),
                body_snippet(&body)
            )));
        }

        let payload: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            WaveError::auth(format!("{failure}: token endpoint returned invalid JSON: {e}"))
        })?;
        Ok(TokenSet::from_json(payload))
    }

    async fn fetch_login_page(&self, auth_url: &str) -> Result<LoginPage> {
        let response = self.http.get(auth_url).send().await?;
        let status = response.status();
        let html = response.text().await?;
        if !status.is_success() {
            return Err(WaveError::auth(format!(
                "Login page request failed (status {}): {}",
                status.as_u16(),
                body_snippet(&html)
            )));
        }
        extract_login_page(&html)
    }

    async fn submit_credentials(&self, page: &LoginPage, email: &str, password: &str) -> Result<()> {
        let url = Url::parse_with_params(
            &self.config.self_asserted_url(),
            &[("tx", page.trans_id.as_str()), ("p", self.config.policy.as_str())],
        )
        .map_err(|e| WaveError::invalid_config(format!("Invalid authority URL: {e}")))?;

        let response = self
            .http
            .post(url)
            .header("X-CSRF-TOKEN", &page.csrf)
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&[
                ("request_type", "RESPONSE"),
                ("email", email),
                ("password", password),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(WaveError::auth(format!(
                "Credential submission failed (status {}): {}",
                status.as_u16(),
                body_snippet(&body)
            )));
        }

        let reply: SelfAssertedResponse = serde_json::from_str(&body).map_err(|e| {
            WaveError::auth(format!("Credential submission returned invalid JSON: {e}"))
        })?;
        match reply.status.as_deref() {
            Some("200" | "success") => Ok(()),
            other => Err(WaveError::auth(format!(
                "Login rejected (status {}): {}",
                other.unwrap_or("missing"),
                reply.message.as_deref().unwrap_or("no message")
            ))),
        }
    }

    /// Walk the confirmation hop, falling back to re-requesting the
    /// authorization page with the now-authenticated cookies.
    async fn follow_confirmation(&self, page: &LoginPage, auth_url: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.config.confirmed_url(),
            &[
                ("rememberMe", "false"),
                ("csrf_token", page.csrf.as_str()),
                ("tx", page.trans_id.as_str()),
                ("p", self.config.policy.as_str()),
            ],
        )
        .map_err(|e| WaveError::invalid_config(format!("Invalid authority URL: {e}")))?;

        let response = self.http.get(url).send().await?;
        let confirmed_status = response.status();
        if let Some(location) = self.app_redirect(&response) {
            return Ok(location);
        }

        tracing::debug!(
            status = confirmed_status.as_u16(),
            "Confirmation did not redirect to the app, retrying authorization page"
        );
        let response = self.http.get(auth_url).send().await?;
        if let Some(location) = self.app_redirect(&response) {
            return Ok(location);
        }

        Err(WaveError::auth(format!(
            "Login did not redirect to {} (confirmation status {}, authorization page status {})",
            self.config.redirect_uri,
            confirmed_status.as_u16(),
            response.status().as_u16()
        )))
    }

    fn app_redirect(&self, response: &reqwest::Response) -> Option<String> {
        if !response.status().is_redirection() {
            return None;
        }
        let location = response.headers().get(LOCATION)?.to_str().ok()?;
        location
            .contains(&self.config.redirect_uri)
            .then(|| location.to_string())
    }
}

/// Generate an opaque value for `state` / `nonce` (base64url, 32 chars)
///
/// Derived from the clock, the process id and a counter. Values are unique
/// per call but not cryptographically random, so they are predictable.
#[must_use]
pub fn generate_state() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    let mut hasher = Sha256::new();
    hasher.update(timestamp.to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    let hash = hasher.finalize();
    URL_SAFE_NO_PAD.encode(&hash[..24])
}

/// Query (or fragment) parameters of a redirect URL
fn redirect_params(url: &str) -> Vec<(String, String)> {
    let params = match url.split_once('?') {
        Some((_, rest)) => rest.split('#').next().unwrap_or_default(),
        None => url.split_once('#').map(|(_, frag)| frag).unwrap_or_default(),
    };
    form_urlencoded::parse(params.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn extract_login_page(html: &str) -> Result<LoginPage> {
    let blob = SETTINGS_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| WaveError::auth("Login page did not contain the SETTINGS script block"))?;

    let settings: LoginSettings = serde_json::from_str(blob.as_str())
        .map_err(|e| WaveError::auth(format!("Login page SETTINGS is not valid JSON: {e}")))?;

    match (settings.csrf, settings.trans_id) {
        (Some(csrf), Some(trans_id)) if !csrf.is_empty() && !trans_id.is_empty() => {
            Ok(LoginPage { csrf, trans_id })
        }
        _ => Err(WaveError::auth(
            "Login page SETTINGS is missing the csrf token or transaction id",
        )),
    }
}
