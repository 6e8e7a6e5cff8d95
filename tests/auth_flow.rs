//! Integration tests for the B2C token endpoint and the scripted login

mod common;

use bradford_white_wave::WaveAuth;
use common::{
    AUTHORIZE_PATH, CONFIRMED_PATH, SELF_ASSERTED_PATH, TOKEN_PATH, auth_config, login_page,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REDIRECT: &str = "com.bradfordwhiteapps.bwconnect://oauth/redirect";

fn auth_for(server: &MockServer) -> WaveAuth {
    WaveAuth::with_config(auth_config(server)).unwrap()
}

// ============================================================================
// Token endpoint
// ============================================================================

#[tokio::test]
async fn test_exchange_code_for_token_success() {
    let server = MockServer::start().await;
    let payload = json!({
        "access_token": "new_access_token",
        "refresh_token": "new_refresh_token",
        "expires_in": 3600
    });

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=test_code"))
        .and(body_string_contains("client_id=7899415d-1c23-46d8-8a79-4c15ed5f7f22"))
        .and(body_string_contains("scope=openid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&payload))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = auth_for(&server)
        .exchange_code_for_token("test_code")
        .await
        .unwrap();

    assert_eq!(tokens.as_json(), &payload);
    assert_eq!(tokens.refresh_token(), Some("new_refresh_token"));
}

#[tokio::test]
async fn test_exchange_code_sends_redirect_uri() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains(
            "redirect_uri=com.bradfordwhiteapps.bwconnect%3A%2F%2Foauth%2Fredirect",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "a"})))
        .expect(1)
        .mount(&server)
        .await;

    auth_for(&server).exchange_code_for_token("c").await.unwrap();
}

#[tokio::test]
async fn test_exchange_code_for_token_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request"))
        .mount(&server)
        .await;

    let err = auth_for(&server)
        .exchange_code_for_token("bad_code")
        .await
        .unwrap_err();

    assert!(err.is_auth());
    let msg = err.to_string();
    assert!(msg.contains("Token exchange failed"), "{msg}");
    assert!(msg.contains("400"), "{msg}");
    assert!(msg.contains("Bad Request"), "{msg}");
}

#[tokio::test]
async fn test_refresh_tokens_success() {
    let server = MockServer::start().await;
    let payload = json!({
        "access_token": "refreshed_access_token",
        "refresh_token": "refreshed_refresh_token",
        "expires_in": 3600,
        "token_type": "Bearer",
        "refresh_token_expires_in": 1_209_600
    });

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=valid_refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&payload))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = auth_for(&server)
        .refresh_tokens("valid_refresh_token")
        .await
        .unwrap();

    assert_eq!(tokens.into_json(), payload);
}

#[tokio::test]
async fn test_refresh_tokens_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"error":"invalid_grant","error_description":"expired"}"#),
        )
        .mount(&server)
        .await;

    let err = auth_for(&server).refresh_tokens("stale").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Token refresh failed"), "{msg}");
    assert!(msg.contains("invalid_grant"), "{msg}");
}

// ============================================================================
// Scripted login
// ============================================================================

async fn mount_login_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(AUTHORIZE_PATH))
        .and(query_param("response_type", "code"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(login_page("csrf-token-1", "StateProperties=tx1")),
        )
        .up_to_n_times(1)
        .mount(server)
        .await;
}

async fn mount_self_asserted(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(SELF_ASSERTED_PATH))
        .and(query_param("tx", "StateProperties=tx1"))
        .and(query_param("p", "B2C_1A_SignIn"))
        .and(header("X-CSRF-TOKEN", "csrf-token-1"))
        .and(body_string_contains("request_type=RESPONSE"))
        .and(body_string_contains("email=owner%40example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_token_exchange(server: &MockServer, code: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains(format!("code={code}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "login_access",
            "refresh_token": "login_refresh",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_scripted_login_success() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;
    mount_self_asserted(&server, json!({"status": "200"})).await;

    Mock::given(method("GET"))
        .and(path(CONFIRMED_PATH))
        .and(query_param("csrf_token", "csrf-token-1"))
        .and(query_param("tx", "StateProperties=tx1"))
        .and(query_param("rememberMe", "false"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{REDIRECT}?state=s&code=LOGIN_CODE")),
        )
        .expect(1)
        .mount(&server)
        .await;

    mount_token_exchange(&server, "LOGIN_CODE").await;

    let tokens = auth_for(&server)
        .authenticate("owner@example.com", "s3cret")
        .await
        .unwrap();

    assert_eq!(tokens.access_token(), Some("login_access"));
    assert_eq!(tokens.refresh_token(), Some("login_refresh"));
}

#[tokio::test]
async fn test_scripted_login_falls_back_to_authorization_page() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;
    mount_self_asserted(&server, json!({"status": "200"})).await;

    Mock::given(method("GET"))
        .and(path(CONFIRMED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>done</html>"))
        .expect(1)
        .mount(&server)
        .await;

    // Second visit to the authorization page, now with a signed-in session
    Mock::given(method("GET"))
        .and(path(AUTHORIZE_PATH))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{REDIRECT}?code=FALLBACK_CODE")),
        )
        .expect(1)
        .mount(&server)
        .await;

    mount_token_exchange(&server, "FALLBACK_CODE").await;

    let tokens = auth_for(&server)
        .authenticate("owner@example.com", "s3cret")
        .await
        .unwrap();
    assert_eq!(tokens.access_token(), Some("login_access"));
}

#[tokio::test]
async fn test_scripted_login_accepts_success_status() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;
    mount_self_asserted(&server, json!({"status": "success"})).await;

    Mock::given(method("GET"))
        .and(path(CONFIRMED_PATH))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{REDIRECT}?code=SUCCESS_CODE")),
        )
        .expect(1)
        .mount(&server)
        .await;

    mount_token_exchange(&server, "SUCCESS_CODE").await;

    let tokens = auth_for(&server)
        .authenticate("owner@example.com", "s3cret")
        .await
        .unwrap();
    assert_eq!(tokens.refresh_token(), Some("login_refresh"));
}

#[tokio::test]
async fn test_scripted_login_credential_endpoint_http_error() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;

    Mock::given(method("POST"))
        .and(path(SELF_ASSERTED_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream unavailable"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CONFIRMED_PATH))
        .respond_with(ResponseTemplate::new(302))
        .expect(0)
        .mount(&server)
        .await;

    let err = auth_for(&server)
        .authenticate("owner@example.com", "s3cret")
        .await
        .unwrap_err();

    assert!(err.is_auth());
    let msg = err.to_string();
    assert!(msg.contains("Credential submission failed"), "{msg}");
    assert!(msg.contains("500"), "{msg}");
    assert!(msg.contains("upstream unavailable"), "{msg}");
}

#[tokio::test]
async fn test_scripted_login_without_settings_blob() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(AUTHORIZE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Maintenance</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SELF_ASSERTED_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = auth_for(&server)
        .authenticate("owner@example.com", "s3cret")
        .await
        .unwrap_err();
    assert!(err.is_auth());
    assert!(err.to_string().contains("SETTINGS"));
}

#[tokio::test]
async fn test_scripted_login_rejected_credentials() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;
    mount_self_asserted(
        &server,
        json!({"status": "400", "errorCode": "AADB2C90225", "message": "Your password is incorrect."}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(CONFIRMED_PATH))
        .respond_with(ResponseTemplate::new(302))
        .expect(0)
        .mount(&server)
        .await;

    let err = auth_for(&server)
        .authenticate("owner@example.com", "wrong")
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Login rejected"), "{msg}");
    assert!(msg.contains("password is incorrect"), "{msg}");
}

#[tokio::test]
async fn test_scripted_login_without_app_redirect() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;
    mount_self_asserted(&server, json!({"status": "200"})).await;

    Mock::given(method("GET"))
        .and(path(CONFIRMED_PATH))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://elsewhere.example/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(AUTHORIZE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>again</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = auth_for(&server)
        .authenticate("owner@example.com", "s3cret")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("did not redirect"));
}
