//! Token refresh engine
//!
//! Decides staleness from the bundle expiry, exchanges refresh tokens and
//! writes fresh bundles back to the vault. Concurrent refreshes of the same
//! vault key share one in-flight request.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use streamsnap_common::auth::now_millis;
use streamsnap_common::{CredentialVault, OAuthClientTrait, TokenBundle};
use streamsnap_domain::constants::REACTIVE_REFRESH_MARGIN_MS;
use streamsnap_domain::{AuthRecovery, Result, StreamSnapError};
use tracing::{debug, info, warn};

type InFlight = Shared<BoxFuture<'static, Result<TokenBundle>>>;

const NO_REFRESH_TOKEN: &str = "No refresh token available";

/// Refreshes and validates token bundles stored in a [`CredentialVault`].
pub struct TokenRefreshEngine {
    vault: Arc<dyn CredentialVault>,
    client: Arc<dyn OAuthClientTrait>,
    in_flight: Mutex<HashMap<String, InFlight>>,
}

impl TokenRefreshEngine {
    pub fn new(vault: Arc<dyn CredentialVault>, client: Arc<dyn OAuthClientTrait>) -> Self {
        Self { vault, client, in_flight: Mutex::new(HashMap::new()) }
    }

    pub fn vault(&self) -> &Arc<dyn CredentialVault> {
        &self.vault
    }

    /// Return a bundle valid for at least `margin_ms`, refreshing if needed.
    ///
    /// # Errors
    /// `NotAuthenticated` when no bundle is stored or the refresh fails.
    pub async fn ensure_valid(&self, vault_key: &str, margin_ms: i64) -> Result<TokenBundle> {
        let bundle = self.vault.get(vault_key).await.ok_or(StreamSnapError::NotAuthenticated)?;
        if bundle.is_valid(margin_ms) {
            return Ok(bundle);
        }

        debug!(vault_key = %vault_key, "access token stale, refreshing");
        self.refresh(vault_key, &bundle).await.map_err(|err| {
            warn!(vault_key = %vault_key, error = %err, "refresh before call failed");
            StreamSnapError::NotAuthenticated
        })
    }

    /// Exchange the bundle's refresh token and persist the result.
    ///
    /// The vault is only written on success. A failed write is logged and the
    /// fresh bundle is still returned.
    ///
    /// # Errors
    /// `RefreshFailed` when the bundle has no refresh token or the token
    /// endpoint rejects it.
    pub async fn refresh(&self, vault_key: &str, bundle: &TokenBundle) -> Result<TokenBundle> {
        let shared = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(vault_key) {
                Some(existing) => {
                    debug!(vault_key = %vault_key, "joining in-flight refresh");
                    existing.clone()
                }
                None => {
                    let fut = refresh_once(
                        Arc::clone(&self.vault),
                        Arc::clone(&self.client),
                        vault_key.to_string(),
                        bundle.clone(),
                    )
                    .boxed()
                    .shared();
                    in_flight.insert(vault_key.to_string(), fut.clone());
                    fut
                }
            }
        };

        let result = shared.clone().await;

        let mut in_flight = self.in_flight.lock();
        if in_flight.get(vault_key).is_some_and(|current| current.ptr_eq(&shared)) {
            in_flight.remove(vault_key);
        }
        result
    }

    /// Refresh when the stored bundle expires within `margin_ms`.
    ///
    /// Bundles without a refresh token or with an unknown expiry are left
    /// alone. Returns whether a refresh happened.
    ///
    /// # Errors
    /// Propagates [`Self::refresh`] failures.
    pub async fn refresh_if_expiring(&self, vault_key: &str, margin_ms: i64) -> Result<bool> {
        let Some(bundle) = self.vault.get(vault_key).await else {
            return Ok(false);
        };
        if !bundle.has_refresh_token() {
            return Ok(false);
        }
        match bundle.expiry {
            None | Some(0) => return Ok(false),
            Some(_) if bundle.is_valid(margin_ms) => return Ok(false),
            Some(_) => {}
        }

        self.refresh(vault_key, &bundle).await?;
        Ok(true)
    }

    /// One refresh attempt after an observed auth failure.
    ///
    /// Never deletes anything; the caller decides what `should_remove` means.
    pub async fn recover(&self, vault_key: &str) -> AuthRecovery {
        let bundle = match self.vault.get(vault_key).await {
            Some(bundle) if bundle.has_refresh_token() => bundle,
            _ => return AuthRecovery::remove(NO_REFRESH_TOKEN),
        };

        match self.refresh(vault_key, &bundle).await {
            Ok(_) => AuthRecovery::refreshed(),
            Err(err) => AuthRecovery::remove(err.to_string()),
        }
    }
}

async fn refresh_once(
    vault: Arc<dyn CredentialVault>,
    client: Arc<dyn OAuthClientTrait>,
    vault_key: String,
    bundle: TokenBundle,
) -> Result<TokenBundle> {
    let refresh_token = bundle
        .refresh_token
        .clone()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| StreamSnapError::RefreshFailed(NO_REFRESH_TOKEN.to_string()))?;

    let response = client
        .refresh_access_token(&refresh_token)
        .await
        .map_err(|err| StreamSnapError::RefreshFailed(err.to_string()))?;

    let fresh = bundle.refreshed_with(response, now_millis());
    if let Err(err) = vault.put(&vault_key, &fresh).await {
        let degraded = StreamSnapError::VaultUnavailable(err.to_string());
        warn!(vault_key = %vault_key, error = %degraded, "refreshed token not persisted");
    } else {
        info!(vault_key = %vault_key, "access token refreshed");
    }
    Ok(fresh)
}

/// Run `op` with a valid access token, retrying once after a 401/403.
///
/// The provider may reject a token that looked valid locally (clock skew,
/// revocation). That triggers exactly one refresh and one retry; a second
/// rejection is returned as is.
///
/// # Errors
/// `NotAuthenticated` when no usable token can be obtained, otherwise
/// whatever `op` returns.
pub async fn with_access_token<T, F, Fut>(
    engine: &TokenRefreshEngine,
    vault_key: &str,
    op: F,
) -> Result<T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let bundle = engine.ensure_valid(vault_key, REACTIVE_REFRESH_MARGIN_MS).await?;

    match op(bundle.access_token.clone()).await {
        Err(err) if err.is_auth_rejection() => {
            warn!(vault_key = %vault_key, error = %err, "token rejected, refreshing once");
            let fresh = engine.refresh(vault_key, &bundle).await.map_err(|refresh_err| {
                warn!(vault_key = %vault_key, error = %refresh_err, "reactive refresh failed");
                StreamSnapError::NotAuthenticated
            })?;
            op(fresh.access_token).await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::refresh.
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use streamsnap_common::testing::{MockOAuthClient, MockVault};
    use streamsnap_common::TokenResponse;

    use super::*;

    const KEY: &str = "drive_tokens:acc1";

    fn engine_with(vault: &MockVault, oauth: &MockOAuthClient) -> TokenRefreshEngine {
        TokenRefreshEngine::new(Arc::new(vault.clone()), Arc::new(oauth.clone()))
    }

    fn bundle(expiry_offset_ms: i64) -> TokenBundle {
        TokenBundle::new("t1", Some("r1".into()), Some(now_millis() + expiry_offset_ms))
    }

    /// Validates `ensure_valid` returns a fresh bundle untouched.
    ///
    /// Assertions:
    /// - Confirms no refresh call is made for a valid token.
    #[tokio::test]
    async fn test_ensure_valid_skips_refresh_when_fresh() {
        let (vault, oauth) = (MockVault::new(), MockOAuthClient::new());
        vault.seed(KEY, bundle(3_600_000));

        let got = engine_with(&vault, &oauth).ensure_valid(KEY, 60_000).await.unwrap();

        assert_eq!(got.access_token, "t1");
        assert_eq!(oauth.refresh_count(), 0);
    }

    /// Validates `ensure_valid` refreshes an expired token and keeps the
    /// refresh token.
    ///
    /// Assertions:
    /// - Confirms exactly one refresh call.
    /// - Confirms the vault holds the merged bundle.
    #[tokio::test]
    async fn test_ensure_valid_refreshes_expired() {
        let (vault, oauth) = (MockVault::new(), MockOAuthClient::new());
        vault.seed(KEY, bundle(-1_000));

        let got = engine_with(&vault, &oauth).ensure_valid(KEY, 60_000).await.unwrap();

        assert_eq!(oauth.refresh_count(), 1);
        assert_eq!(got.access_token, "refreshed_access_token");
        assert_eq!(got.refresh_token.as_deref(), Some("r1"));
        assert_eq!(vault.peek(KEY), Some(got));
    }

    /// Validates failure mapping and vault immutability on failure.
    ///
    /// Assertions:
    /// - Ensures a missing bundle is `NotAuthenticated`.
    /// - Ensures a rejected refresh is `NotAuthenticated` and the vault is
    ///   not written.
    #[tokio::test]
    async fn test_ensure_valid_failures() {
        let (vault, oauth) = (MockVault::new(), MockOAuthClient::new());
        let engine = engine_with(&vault, &oauth);
        assert_eq!(engine.ensure_valid(KEY, 0).await, Err(StreamSnapError::NotAuthenticated));

        let stale = bundle(-1_000);
        vault.seed(KEY, stale.clone());
        oauth.set_should_fail(true);

        assert_eq!(engine.ensure_valid(KEY, 0).await, Err(StreamSnapError::NotAuthenticated));
        assert_eq!(vault.put_count(), 0);
        assert_eq!(vault.peek(KEY), Some(stale));
    }

    /// Validates a bundle without refresh token short-circuits.
    ///
    /// Assertions:
    /// - Ensures the error text and that no network call was attempted.
    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let (vault, oauth) = (MockVault::new(), MockOAuthClient::new());
        let engine = engine_with(&vault, &oauth);
        let bare = TokenBundle::new("t1", None, Some(0));

        let err = engine.refresh(KEY, &bare).await.unwrap_err();

        assert_eq!(err, StreamSnapError::RefreshFailed("No refresh token available".into()));
        assert_eq!(oauth.refresh_count(), 0);
    }

    /// Validates a failed vault write still yields the fresh bundle.
    ///
    /// Assertions:
    /// - Confirms the refresh result is returned despite the write failure.
    #[tokio::test]
    async fn test_refresh_survives_vault_write_failure() {
        let (vault, oauth) = (MockVault::new(), MockOAuthClient::new());
        vault.set_fail_put(true);

        let fresh = engine_with(&vault, &oauth).refresh(KEY, &bundle(-1)).await.unwrap();
        assert_eq!(fresh.access_token, "refreshed_access_token");
    }

    /// Validates concurrent refreshes of one key share a single request.
    ///
    /// Assertions:
    /// - Confirms three concurrent callers cause one token endpoint call.
    /// - Confirms the in-flight table is empty afterwards.
    #[tokio::test]
    async fn test_concurrent_refreshes_are_deduplicated() {
        let (vault, oauth) = (MockVault::new(), MockOAuthClient::new());
        oauth.set_delay(Duration::from_millis(50));
        let engine = engine_with(&vault, &oauth);
        let stale = bundle(-1_000);

        let (a, b, c) = tokio::join!(
            engine.refresh(KEY, &stale),
            engine.refresh(KEY, &stale),
            engine.refresh(KEY, &stale)
        );

        assert_eq!(oauth.refresh_count(), 1);
        assert_eq!(a.unwrap(), b.unwrap());
        assert!(c.is_ok());
        assert!(engine.in_flight.lock().is_empty());

        engine.refresh(KEY, &stale).await.unwrap();
        assert_eq!(oauth.refresh_count(), 2);
    }

    /// Validates `refresh_if_expiring` skip rules.
    ///
    /// Assertions:
    /// - Ensures unknown and zero expiries are skipped.
    /// - Ensures only bundles inside the margin are refreshed.
    #[tokio::test]
    async fn test_refresh_if_expiring_rules() {
        let (vault, oauth) = (MockVault::new(), MockOAuthClient::new());
        let engine = engine_with(&vault, &oauth);

        vault.seed("unknown", TokenBundle::new("t", Some("r".into()), None));
        vault.seed("zero", TokenBundle::new("t", Some("r".into()), Some(0)));
        vault.seed("fresh", bundle(3_600_000));
        vault.seed("soon", bundle(60_000));

        assert!(!engine.refresh_if_expiring("missing", 300_000).await.unwrap());
        assert!(!engine.refresh_if_expiring("unknown", 300_000).await.unwrap());
        assert!(!engine.refresh_if_expiring("zero", 300_000).await.unwrap());
        assert!(!engine.refresh_if_expiring("fresh", 300_000).await.unwrap());
        assert!(engine.refresh_if_expiring("soon", 300_000).await.unwrap());
        assert_eq!(oauth.refresh_count(), 1);
    }

    /// Validates `recover` outcomes.
    ///
    /// Assertions:
    /// - Confirms a missing refresh token asks for removal.
    /// - Confirms a rejected refresh asks for removal with the reason.
    /// - Confirms a successful refresh reports `refreshed`.
    #[tokio::test]
    async fn test_recover_outcomes() {
        let (vault, oauth) = (MockVault::new(), MockOAuthClient::new());
        let engine = engine_with(&vault, &oauth);

        vault.seed(KEY, TokenBundle::new("t", None, Some(1)));
        let none = engine.recover(KEY).await;
        assert!(none.should_remove);
        assert_eq!(none.reason.as_deref(), Some("No refresh token available"));

        vault.seed(KEY, bundle(-1));
        oauth.set_should_fail(true);
        let failed = engine.recover(KEY).await;
        assert!(failed.should_remove && !failed.refreshed);
        assert!(failed.reason.unwrap().contains("400"));

        oauth.set_should_fail(false);
        assert_eq!(engine.recover(KEY).await, AuthRecovery::refreshed());
    }

    /// Validates `with_access_token` retries exactly once after a 401.
    ///
    /// Assertions:
    /// - Confirms the second attempt uses the refreshed token.
    /// - Confirms a persistent 401 is surfaced after one retry.
    #[tokio::test]
    async fn test_with_access_token_retries_once() {
        let (vault, oauth) = (MockVault::new(), MockOAuthClient::new());
        oauth.set_refresh_response(TokenResponse {
            access_token: "t2".into(),
            refresh_token: None,
            expires_in: Some(3600),
            token_type: None,
            scope: None,
        });
        vault.seed(KEY, bundle(3_600_000));
        let engine = engine_with(&vault, &oauth);
        let calls = AtomicUsize::new(0);

        let token = with_access_token(&engine, KEY, |token| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if token == "t1" {
                    Err(StreamSnapError::ProviderApi { status: 401, body: String::new() })
                } else {
                    Ok(token)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(token, "t2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        calls.store(0, Ordering::SeqCst);
        let err = with_access_token(&engine, KEY, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(StreamSnapError::ProviderApi { status: 403, body: "no".into() }) }
        })
        .await
        .unwrap_err();
        assert!(err.is_auth_rejection());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(oauth.refresh_count(), 2);
    }
}
