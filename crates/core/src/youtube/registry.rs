//! YouTube account registry
//!
//! Unlike Drive, relinking a known channel updates it in place. The
//! document is a bare JSON array of records.

use std::sync::Arc;

use streamsnap_common::auth::now_millis;
use streamsnap_common::{CredentialVault, TokenBundle};
use streamsnap_domain::constants::{
    youtube_vault_key, PROACTIVE_REFRESH_MARGIN_MS, YOUTUBE_ACCOUNT_ID_PREFIX,
};
use streamsnap_domain::{
    AuthRecovery, Result, StreamSnapError, YouTubeAccount, YouTubeAccountPatch,
    YouTubeAccountRecord, YouTubeProfile,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::TokenRefreshEngine;
use crate::storage_ports::DocumentStore;

pub struct YouTubeAccountRegistry {
    store: Arc<dyn DocumentStore<Vec<YouTubeAccountRecord>>>,
    refresher: Arc<TokenRefreshEngine>,
    state: Mutex<Vec<YouTubeAccountRecord>>,
}

impl YouTubeAccountRegistry {
    /// Read the document and move any inline tokens into the vault.
    ///
    /// Records whose tokens could not be stored keep them so nothing is
    /// lost; the next load retries.
    ///
    /// # Errors
    /// Returns the store error when the document cannot be read.
    pub async fn load(
        store: Arc<dyn DocumentStore<Vec<YouTubeAccountRecord>>>,
        refresher: Arc<TokenRefreshEngine>,
    ) -> Result<Self> {
        let mut records = store.load().await?.unwrap_or_default();
        let mut dirty = false;

        for record in &mut records {
            if record.account.vault_key.is_empty() {
                record.account.vault_key = youtube_vault_key(&record.account.id);
                dirty = true;
            }
            if !record.has_inline_tokens() {
                continue;
            }

            let bundle = TokenBundle::new(
                record.access_token.clone().unwrap_or_default(),
                record.refresh_token.clone(),
                record.token_expiry,
            );
            match refresher.vault().put(&record.account.vault_key, &bundle).await {
                Ok(()) => {
                    record.strip_inline_tokens();
                    dirty = true;
                    info!(account_id = %record.account.id, "inline youtube tokens moved to vault");
                }
                Err(err) => {
                    warn!(account_id = %record.account.id, error = %err, "keeping inline tokens");
                }
            }
        }

        if dirty {
            if let Err(err) = store.save(&records).await {
                warn!(error = %err, "failed to persist migrated youtube accounts");
            }
        }

        debug!(accounts = records.len(), "youtube registry loaded");
        Ok(Self { store, refresher, state: Mutex::new(records) })
    }

    fn vault(&self) -> &Arc<dyn CredentialVault> {
        self.refresher.vault()
    }

    pub async fn list(&self) -> Vec<YouTubeAccount> {
        self.state.lock().await.iter().map(|r| r.account.clone()).collect()
    }

    pub async fn get_active(&self) -> Vec<YouTubeAccount> {
        self.list().await.into_iter().filter(|a| a.active).collect()
    }

    pub async fn get(&self, account_id: &str) -> Option<YouTubeAccount> {
        let state = self.state.lock().await;
        state.iter().find(|r| r.account.id == account_id).map(|r| r.account.clone())
    }

    /// # Errors
    /// `AccountNotFound` when no account has this id.
    pub async fn require(&self, account_id: &str) -> Result<YouTubeAccount> {
        self.get(account_id)
            .await
            .ok_or_else(|| StreamSnapError::AccountNotFound(account_id.to_string()))
    }

    async fn commit(
        &self,
        state: &mut Vec<YouTubeAccountRecord>,
        next: Vec<YouTubeAccountRecord>,
    ) -> Result<()> {
        self.store.save(&next).await?;
        *state = next;
        Ok(())
    }

    /// Insert or refresh the account for this identity.
    ///
    /// A known channel (or email) keeps its id and gets the new bundle and
    /// profile; `updated_at` always moves forward.
    ///
    /// # Errors
    /// `VaultUnavailable` when the bundle cannot be stored, or the store
    /// error.
    pub async fn upsert(
        &self,
        profile: &YouTubeProfile,
        bundle: &TokenBundle,
    ) -> Result<YouTubeAccount> {
        let mut state = self.state.lock().await;
        let existing = state.iter().position(|r| r.account.matches(profile));
        let account_id = match existing {
            Some(index) => state[index].account.id.clone(),
            None => format!("{YOUTUBE_ACCOUNT_ID_PREFIX}{}", Uuid::new_v4().simple()),
        };
        let vault_key = youtube_vault_key(&account_id);

        self.vault()
            .put(&vault_key, bundle)
            .await
            .map_err(|err| StreamSnapError::VaultUnavailable(err.to_string()))?;

        let now = now_millis();
        let mut next = state.clone();
        let account = match existing {
            Some(index) => {
                let record = &mut next[index];
                record.strip_inline_tokens();
                let account = &mut record.account;
                if let Some(email) = profile.email.as_deref().filter(|e| !e.is_empty()) {
                    account.email = Some(email.to_string());
                }
                account.channel_id = profile.channel.channel_id.clone();
                account.channel_name = profile.channel.channel_name.clone();
                account.thumbnail = profile.channel.thumbnail.clone();
                account.vault_key = vault_key.clone();
                account.active = true;
                account.needs_reauth = false;
                account.updated_at = now.max(account.updated_at + 1);
                account.clone()
            }
            None => {
                let account = YouTubeAccount {
                    id: account_id.clone(),
                    email: profile.email.clone().filter(|e| !e.is_empty()),
                    channel_id: profile.channel.channel_id.clone(),
                    channel_name: profile.channel.channel_name.clone(),
                    thumbnail: profile.channel.thumbnail.clone(),
                    vault_key: vault_key.clone(),
                    active: true,
                    default_privacy: None,
                    selected_playlist_id: None,
                    needs_reauth: false,
                    created_at: now,
                    updated_at: now,
                };
                next.push(account.clone().into());
                account
            }
        };

        let committed = self.commit(&mut state, next).await;
        if let Err(err) = committed {
            drop(state);
            if existing.is_none() {
                if let Err(err) = self.vault().delete(&vault_key).await {
                    warn!(account_id = %account_id, error = %err, "failed to delete token bundle");
                }
            }
            return Err(err);
        }

        info!(
            account_id = %account_id,
            channel_id = %account.channel_id,
            updated = existing.is_some(),
            "youtube account linked"
        );
        Ok(account)
    }

    /// # Errors
    /// `AccountNotFound` or the store error.
    pub async fn update(
        &self,
        account_id: &str,
        patch: &YouTubeAccountPatch,
    ) -> Result<YouTubeAccount> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let record = next
            .iter_mut()
            .find(|r| r.account.id == account_id)
            .ok_or_else(|| StreamSnapError::AccountNotFound(account_id.to_string()))?;
        patch.apply(&mut record.account);
        record.account.updated_at = now_millis().max(record.account.updated_at + 1);
        let updated = record.account.clone();

        self.commit(&mut state, next).await?;
        Ok(updated)
    }

    /// # Errors
    /// `AccountNotFound` or the store error.
    pub async fn mark_needs_reauth(&self, account_id: &str, needs: bool) -> Result<YouTubeAccount> {
        let patch =
            YouTubeAccountPatch { needs_reauth: Some(needs), ..YouTubeAccountPatch::default() };
        self.update(account_id, &patch).await
    }

    /// Remove the account; secret deletion is best effort.
    ///
    /// # Errors
    /// Returns the store error.
    pub async fn remove(&self, account_id: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        let Some(record) = state.iter().find(|r| r.account.id == account_id) else {
            return Ok(false);
        };

        if let Err(err) = self.vault().delete(&record.account.vault_key).await {
            warn!(account_id = %account_id, error = %err, "failed to delete token bundle");
        }

        let next: Vec<_> = state.iter().filter(|r| r.account.id != account_id).cloned().collect();
        self.commit(&mut state, next).await?;

        info!(account_id = %account_id, "youtube account removed");
        Ok(true)
    }

    /// Proactive sweep over every channel. Returns the success count.
    pub async fn refresh_all_tokens(&self) -> usize {
        let accounts = self.list().await;
        let mut refreshed = 0;

        for account in &accounts {
            match self
                .refresher
                .refresh_if_expiring(&account.vault_key, PROACTIVE_REFRESH_MARGIN_MS)
                .await
            {
                Ok(true) => {
                    refreshed += 1;
                    if account.needs_reauth {
                        if let Err(err) = self.mark_needs_reauth(&account.id, false).await {
                            warn!(
                                account_id = %account.id,
                                error = %err,
                                "failed to clear reauth flag"
                            );
                        }
                    }
                }
                Ok(false) => {}
                Err(err) => warn!(account_id = %account.id, error = %err, "sweep refresh failed"),
            }
        }

        info!(refreshed, total = accounts.len(), "youtube token sweep finished");
        refreshed
    }

    /// Reactive recovery after an API call was rejected.
    pub async fn handle_auth_error(&self, account_id: &str) -> AuthRecovery {
        let Some(account) = self.get(account_id).await else {
            return AuthRecovery::remove("Account not found");
        };

        let recovery = self.refresher.recover(&account.vault_key).await;
        if account.needs_reauth == recovery.refreshed {
            if let Err(err) = self.mark_needs_reauth(account_id, !recovery.refreshed).await {
                warn!(account_id = %account_id, error = %err, "failed to update reauth flag");
            }
        }
        recovery
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for youtube::registry.
    use streamsnap_common::testing::{MockOAuthClient, MockVault};
    use streamsnap_domain::{ChannelInfo, YouTubePrivacy};

    use super::*;
    use crate::test_support::{fresh_bundle, MemoryStore};

    struct Harness {
        registry: YouTubeAccountRegistry,
        store: Arc<MemoryStore<Vec<YouTubeAccountRecord>>>,
        vault: MockVault,
        oauth: MockOAuthClient,
    }

    async fn harness_with(records: Option<Vec<YouTubeAccountRecord>>, vault: MockVault) -> Harness {
        let store = MemoryStore::new(records);
        let oauth = MockOAuthClient::new();
        let refresher =
            Arc::new(TokenRefreshEngine::new(Arc::new(vault.clone()), Arc::new(oauth.clone())));
        let registry = YouTubeAccountRegistry::load(store.clone(), refresher)
            .await
            .expect("load should succeed");
        Harness { registry, store, vault, oauth }
    }

    async fn harness(records: Option<Vec<YouTubeAccountRecord>>) -> Harness {
        harness_with(records, MockVault::new()).await
    }

    fn profile(channel_id: &str, email: Option<&str>) -> YouTubeProfile {
        YouTubeProfile {
            email: email.map(str::to_string),
            channel: ChannelInfo {
                channel_id: channel_id.to_string(),
                channel_name: format!("Channel {channel_id}"),
                thumbnail: None,
            },
        }
    }

    /// Validates relinking the same channel updates in place.
    ///
    /// Assertions:
    /// - Confirms the registry size stays at one.
    /// - Confirms `updated_at` strictly advances.
    /// - Confirms the vault holds the newest bundle.
    #[tokio::test]
    async fn test_upsert_same_channel_updates_in_place() {
        let h = harness(None).await;

        let first = h.registry.upsert(&profile("UC1", None), &fresh_bundle("t1")).await.unwrap();
        let second = h
            .registry
            .upsert(&profile("UC1", Some("me@gmail.com")), &fresh_bundle("t2"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert!(first.id.starts_with("yt_"));
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.email.as_deref(), Some("me@gmail.com"));
        assert_eq!(h.registry.list().await.len(), 1);
        assert_eq!(h.vault.peek(&second.vault_key).unwrap().access_token, "t2");
    }

    /// Validates email is a second identity key.
    ///
    /// Assertions:
    /// - Ensures a matching email merges even with a new channel id.
    /// - Ensures a different identity creates a second account.
    #[tokio::test]
    async fn test_upsert_matches_on_email() {
        let h = harness(None).await;
        let first = h
            .registry
            .upsert(&profile("UC1", Some("me@gmail.com")), &fresh_bundle("t1"))
            .await
            .unwrap();
        let merged = h
            .registry
            .upsert(&profile("UC2", Some("me@gmail.com")), &fresh_bundle("t2"))
            .await
            .unwrap();
        assert_eq!(first.id, merged.id);
        assert_eq!(merged.channel_id, "UC2");

        h.registry.upsert(&profile("UC3", None), &fresh_bundle("t3")).await.unwrap();
        assert_eq!(h.registry.list().await.len(), 2);
    }

    /// Validates a failed write of a new account removes its secret.
    ///
    /// Assertions:
    /// - Ensures the store error surfaces.
    /// - Ensures the vault is left empty.
    #[tokio::test]
    async fn test_upsert_store_failure_rolls_back() {
        let h = harness(None).await;
        h.store.fail_save.store(true, std::sync::atomic::Ordering::SeqCst);

        assert!(h.registry.upsert(&profile("UC1", None), &fresh_bundle("t1")).await.is_err());
        assert!(h.registry.list().await.is_empty());
        assert!(h.vault.keys().is_empty());
    }

    fn legacy_record(id: &str) -> YouTubeAccountRecord {
        let json = format!(
            r#"{{"id":"{id}","channelId":"UC{id}","channelName":"Old",
                "accessToken":"inline","refreshToken":"inline-r","tokenExpiry":99}}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    /// Validates inline tokens move into the vault at load.
    ///
    /// Assertions:
    /// - Confirms the bundle lands under the namespaced key.
    /// - Confirms the persisted document no longer carries tokens.
    #[tokio::test]
    async fn test_load_migrates_inline_tokens() {
        let h = harness(Some(vec![legacy_record("yt_a")])).await;

        let stored = h.vault.peek("youtube_tokens:yt_a").unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("inline-r"));
        assert_eq!(stored.expiry, Some(99));

        let persisted = h.store.snapshot().unwrap();
        assert!(!persisted[0].has_inline_tokens());
        assert_eq!(persisted[0].account.vault_key, "youtube_tokens:yt_a");
    }

    /// Validates inline tokens survive when the vault refuses them.
    ///
    /// Assertions:
    /// - Ensures the persisted record still carries its tokens.
    #[tokio::test]
    async fn test_load_keeps_tokens_when_vault_fails() {
        let vault = MockVault::new();
        vault.set_fail_put(true);
        let h = harness_with(Some(vec![legacy_record("yt_b")]), vault).await;

        assert!(h.store.snapshot().unwrap()[0].has_inline_tokens());
        assert!(h.vault.keys().is_empty());
    }

    /// Validates `update`, `remove` and recovery flags.
    ///
    /// Assertions:
    /// - Confirms a patch changes preferences and advances `updated_at`.
    /// - Confirms a failed recovery sets `needs_reauth`.
    /// - Confirms removal deletes the secret and the entry.
    #[tokio::test]
    async fn test_update_recover_remove() {
        let h = harness(None).await;
        let account = h.registry.upsert(&profile("UC1", None), &fresh_bundle("t1")).await.unwrap();

        let patch = YouTubeAccountPatch {
            default_privacy: Some(Some(YouTubePrivacy::Unlisted)),
            ..YouTubeAccountPatch::default()
        };
        let updated = h.registry.update(&account.id, &patch).await.unwrap();
        assert_eq!(updated.default_privacy, Some(YouTubePrivacy::Unlisted));
        assert!(updated.updated_at > account.updated_at);

        h.oauth.set_should_fail(true);
        assert!(h.registry.handle_auth_error(&account.id).await.should_remove);
        assert!(h.registry.get(&account.id).await.unwrap().needs_reauth);

        assert!(h.registry.remove(&account.id).await.unwrap());
        assert!(h.registry.get_active().await.is_empty());
        assert!(!h.vault.contains(&account.vault_key));
    }
}
