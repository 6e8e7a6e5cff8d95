//! Token payloads from the identity provider and the claims we read out of them

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Result, WaveError};

/// Token endpoint response, kept exactly as the provider sent it
///
/// The provider's payload is stored verbatim so callers can persist or inspect
/// fields this crate does not model. Typed accessors cover the fields the
/// client relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSet(serde_json::Value);

impl TokenSet {
    /// Wrap a raw token endpoint payload
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Access token for API calls.
    ///
    /// Some B2C policies only issue an `id_token`; it is accepted as the bearer
    /// credential when `access_token` is absent.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.str_field("access_token")
            .or_else(|| self.str_field("id_token"))
    }

    /// Refresh token, if the provider issued one
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.str_field("refresh_token")
    }

    /// Lifetime of the access token in seconds
    #[must_use]
    pub fn expires_in(&self) -> Option<u64> {
        match self.0.get("expires_in")? {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Borrow the raw payload
    #[must_use]
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Take the raw payload
    #[must_use]
    pub fn into_json(self) -> serde_json::Value {
        self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl PartialEq<serde_json::Value> for TokenSet {
    fn eq(&self, other: &serde_json::Value) -> bool {
        &self.0 == other
    }
}

/// Extract the account identifier from an access token's claims.
///
/// The JWT payload is decoded without signature verification: the token came
/// straight from the provider's token endpoint over TLS. The `oid` claim is
/// preferred, `sub` is accepted when `oid` is missing.
///
/// # Errors
///
/// Returns [`WaveError::Auth`] if the token is not a three-part JWT, the payload
/// is not base64url JSON, or neither claim is present.
pub fn account_id_from_token(access_token: &str) -> Result<String> {
    let mut parts = access_token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => {
            return Err(WaveError::auth(
                "Access token is not a JWT; cannot extract account id",
            ));
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| WaveError::auth(format!("Failed to decode token payload: {e}")))?;

    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| WaveError::auth(format!("Token payload is not valid JSON: {e}")))?;

    ["oid", "sub"]
        .iter()
        .find_map(|claim| claims.get(*claim).and_then(serde_json::Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| WaveError::auth("Could not extract account id (oid) from access token"))
}

/// Seconds since the Unix epoch
pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}
