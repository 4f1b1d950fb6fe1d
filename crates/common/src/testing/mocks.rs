//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::{
    CredentialVault, OAuthClientError, OAuthClientTrait, TokenBundle, TokenResponse, VaultError,
};

type BundleMap = Arc<Mutex<HashMap<String, TokenBundle>>>;

/// In-memory credential vault.
///
/// Clones share storage, so a test can keep one handle for inspection while
/// the code under test owns another.
///
/// # Examples
///
/// ```
/// use streamsnap_common::testing::MockVault;
/// use streamsnap_common::TokenBundle;
///
/// let vault = MockVault::new();
/// vault.seed("drive_tokens:a1", TokenBundle::new("t1", Some("r1".into()), Some(1)));
/// assert!(vault.contains("drive_tokens:a1"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockVault {
    storage: BundleMap,
    fail_put: Arc<AtomicBool>,
    fail_delete: Arc<AtomicBool>,
    puts: Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
}

impl MockVault {
    /// Create an empty vault.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a bundle without counting it as a `put`.
    pub fn seed(&self, key: &str, bundle: TokenBundle) {
        self.storage.lock().unwrap().insert(key.to_string(), bundle);
    }

    /// Read a bundle synchronously.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<TokenBundle> {
        self.storage.lock().unwrap().get(key).cloned()
    }

    /// Whether a bundle exists under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.storage.lock().unwrap().contains_key(key)
    }

    /// All stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.storage.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Make every subsequent `put` fail with `Unavailable`.
    pub fn set_fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `delete` fail with `Unavailable`.
    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `put` calls.
    #[must_use]
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls, successful or not.
    #[must_use]
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialVault for MockVault {
    async fn put(&self, key: &str, bundle: &TokenBundle) -> Result<(), VaultError> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(VaultError::Unavailable("mock vault rejected write".into()));
        }
        self.storage.lock().unwrap().insert(key.to_string(), bundle.clone());
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, key: &str) -> Option<TokenBundle> {
        self.peek(key)
    }

    async fn delete(&self, key: &str) -> Result<(), VaultError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(VaultError::Unavailable("mock vault rejected delete".into()));
        }
        self.storage.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Mock OAuth client that simulates token endpoint grants without network
/// calls.
#[derive(Clone, Debug)]
pub struct MockOAuthClient {
    refresh_calls: Arc<AtomicUsize>,
    exchange_calls: Arc<AtomicUsize>,
    refresh_response: Arc<Mutex<Option<TokenResponse>>>,
    should_fail: Arc<AtomicBool>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl MockOAuthClient {
    /// Create a new mock OAuth client with default state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            refresh_calls: Arc::new(AtomicUsize::new(0)),
            exchange_calls: Arc::new(AtomicUsize::new(0)),
            refresh_response: Arc::new(Mutex::new(None)),
            should_fail: Arc::new(AtomicBool::new(false)),
            delay: Arc::new(Mutex::new(None)),
        }
    }

    /// Configure the response returned by `refresh_access_token`.
    pub fn set_refresh_response(&self, response: TokenResponse) {
        *self.refresh_response.lock().unwrap() = Some(response);
    }

    /// Force refresh calls to fail with a `400 invalid_grant` rejection.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Hold every refresh call open for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Number of refresh grants issued.
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Number of code exchanges issued.
    #[must_use]
    pub fn exchange_count(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    /// Reset internal state.
    pub fn reset(&self) {
        self.refresh_calls.store(0, Ordering::SeqCst);
        self.exchange_calls.store(0, Ordering::SeqCst);
        self.should_fail.store(false, Ordering::SeqCst);
        *self.refresh_response.lock().unwrap() = None;
        *self.delay.lock().unwrap() = None;
    }
}

impl Default for MockOAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

fn mock_response(access_token: &str, refresh_token: Option<&str>) -> TokenResponse {
    TokenResponse {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.map(ToOwned::to_owned),
        expires_in: Some(3600),
        token_type: Some("Bearer".to_string()),
        scope: None,
    }
}

#[async_trait]
impl OAuthClientTrait for MockOAuthClient {
    async fn exchange_code(
        &self,
        _code: &str,
        _code_verifier: &str,
        _redirect_uri: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        Ok(mock_response("mock_access_token", Some("mock_refresh_token")))
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(OAuthClientError::Rejected {
                status: 400,
                body: r#"{"error":"invalid_grant"}"#.to_string(),
            });
        }

        let configured = self.refresh_response.lock().unwrap().clone();
        Ok(configured.unwrap_or_else(|| mock_response("refreshed_access_token", None)))
    }
}
