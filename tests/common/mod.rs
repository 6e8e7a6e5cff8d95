//! Shared fixtures for integration tests against a mock B2C tenant and API gateway

#![allow(dead_code)]

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use bradford_white_wave::{AuthConfig, ClientConfig};
use std::time::Duration;
use wiremock::MockServer;

pub const TENANT_PATH: &str = "/bwtest.onmicrosoft.com/B2C_1A_SignIn";
pub const TOKEN_PATH: &str = "/bwtest.onmicrosoft.com/B2C_1A_SignIn/oauth2/v2.0/token";
pub const AUTHORIZE_PATH: &str = "/bwtest.onmicrosoft.com/B2C_1A_SignIn/oauth2/v2.0/authorize";
pub const SELF_ASSERTED_PATH: &str = "/bwtest.onmicrosoft.com/B2C_1A_SignIn/SelfAsserted";
pub const CONFIRMED_PATH: &str =
    "/bwtest.onmicrosoft.com/B2C_1A_SignIn/api/CombinedSigninAndSignup/confirmed";

pub const ACCOUNT_OID: &str = "5f3c9a2e-0000-4000-8000-000000000001";

/// Route library logs to the test harness; repeat calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("bradford_white_wave=debug"))
        .with_test_writer()
        .try_init();
}

/// Unsigned JWT carrying the given claims
pub fn jwt(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.sig")
}

/// Access token for the test account
pub fn access_token(tag: &str) -> String {
    jwt(&serde_json::json!({ "oid": ACCOUNT_OID, "tag": tag }))
}

/// Auth configuration pointing at the mock server
pub fn auth_config(server: &MockServer) -> AuthConfig {
    AuthConfig {
        authority: format!("{}{TENANT_PATH}", server.uri()),
        ..AuthConfig::default()
    }
}

/// Client configuration pointing both the gateway and the tenant at the mock server
pub fn client_config(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .base_url(server.uri())
        .timeout(Duration::from_secs(5))
        .auth(auth_config(server))
        .build()
}

/// B2C login page with the embedded SETTINGS blob
pub fn login_page(csrf: &str, trans_id: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>Sign in</title>
<script type="text/javascript">
var CONTENT = {{"email_pattern": "^[a-z]+$"}};
var SETTINGS = {{"remoteResource":"https://example/unified.html","retryLimit":3,"csrf":"{csrf}","transId":"{trans_id}","pageViewId":"abc","hosts":{{"tenant":"/bwtest.onmicrosoft.com/B2C_1A_SignIn","policy":"B2C_1A_SignIn"}},"locale":{{"lang":"en"}}}};
</script></head><body><div id="api"></div></body></html>"#
    )
}
