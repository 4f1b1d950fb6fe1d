//! Shared wiring for the command integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use streamsnap_common::auth::now_millis;
use streamsnap_common::testing::MockVault;
use streamsnap_common::TokenBundle;
use streamsnap_domain::constants::{drive_vault_key, DRIVE_ACCOUNTS_FILE};
use streamsnap_domain::{AppConfig, DomainInfo, DriveAccount, DriveAccountsDocument, EndpointConfig};
use streamsnap_infra::testing::RedirectingBrowser;
use streamsnap_infra::BrowserLauncher;
use streamsnap_lib::AppContext;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// App wired to a mock Google and an in-memory vault.
pub struct TestApp {
    pub ctx: AppContext,
    pub vault: Arc<MockVault>,
    pub server: MockServer,
    /// Keep the data directory alive for the lifetime of the app.
    pub data_dir: TempDir,
}

pub fn test_config(server: &MockServer, data_dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.google.client_id = "client".into();
    config.google.client_secret = Some("secret".into());
    config.storage.data_dir = Some(data_dir.path().to_path_buf());
    config.oauth.timeout_secs = 5;
    config.endpoints = EndpointConfig::with_base(&server.uri());
    config
}

/// Start a context over pre-seeded storage.
pub async fn start_app(
    server: MockServer,
    data_dir: TempDir,
    vault: Arc<MockVault>,
    launcher: Arc<dyn BrowserLauncher>,
) -> TestApp {
    let config = test_config(&server, &data_dir);
    let ctx = AppContext::with_components(config, vault.clone(), launcher)
        .await
        .expect("context should wire");
    TestApp { ctx, vault, server, data_dir }
}

/// App with no accounts whose browser never redirects.
pub async fn empty_app() -> TestApp {
    let server = MockServer::start().await;
    let data_dir = tempfile::tempdir().expect("temp dir");
    start_app(server, data_dir, Arc::new(MockVault::new()), Arc::new(RedirectingBrowser::silent()))
        .await
}

/// App with one Drive account `id` whose bundle expires `expiry_offset_ms`
/// from now.
pub async fn drive_app_with_account(id: &str, email: &str, expiry_offset_ms: i64) -> TestApp {
    let server = MockServer::start().await;
    let data_dir = tempfile::tempdir().expect("temp dir");

    let profile = DomainInfo::from_email(email);
    let account = DriveAccount::new(id, drive_vault_key(id), profile.as_ref(), None, now_millis());
    let document =
        DriveAccountsDocument { accounts: vec![account], default_account_id: Some(id.into()) };
    std::fs::write(
        data_dir.path().join(DRIVE_ACCOUNTS_FILE),
        serde_json::to_vec(&document).expect("document serializes"),
    )
    .expect("document written");

    let vault = Arc::new(MockVault::new());
    vault.seed(
        &drive_vault_key(id),
        TokenBundle::new("t1", Some("r1".into()), Some(now_millis() + expiry_offset_ms)),
    );

    start_app(server, data_dir, vault, Arc::new(RedirectingBrowser::silent())).await
}

/// Token endpoint answering refresh grants.
pub async fn mount_refresh(server: &MockServer, status: u16, expected_calls: u64) {
    let response = if status == 200 {
        ResponseTemplate::new(200).set_body_json(json!({"access_token": "t2", "expires_in": 3600}))
    } else {
        ResponseTemplate::new(status).set_body_string(r#"{"error":"invalid_grant"}"#)
    };
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(response)
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Token endpoint answering the authorization-code grant.
pub async fn mount_code_exchange(server: &MockServer, access_token: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "refresh_token": "r1",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}
