//! Drive account registry
//!
//! Single authoritative in-memory copy of `drive_accounts.json`. Every
//! mutation builds the next document, persists it, and only then replaces
//! the in-memory copy, so a failed write leaves both sides unchanged.

use std::collections::HashSet;
use std::sync::Arc;

use streamsnap_common::auth::now_millis;
use streamsnap_common::CredentialVault;
use streamsnap_domain::constants::{
    drive_vault_key, LEGACY_DRIVE_VAULT_KEY, PROACTIVE_REFRESH_MARGIN_MS,
    REACTIVE_REFRESH_MARGIN_MS,
};
use streamsnap_domain::{
    AuthRecovery, DomainInfo, DriveAccount, DriveAccountPatch, DriveAccountsDocument, Result,
    StreamSnapError,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ports::DriveGateway;
use crate::auth::ports::AuthorizationFlow;
use crate::auth::TokenRefreshEngine;
use crate::storage_ports::DocumentStore;

pub struct DriveAccountRegistry {
    store: Arc<dyn DocumentStore<DriveAccountsDocument>>,
    flow: Arc<dyn AuthorizationFlow>,
    gateway: Arc<dyn DriveGateway>,
    refresher: Arc<TokenRefreshEngine>,
    state: Mutex<DriveAccountsDocument>,
    /// Accounts whose profile lookup already ran in this process
    profile_attempted: parking_lot::Mutex<HashSet<String>>,
}

impl DriveAccountRegistry {
    /// Read the registry document (empty when missing).
    ///
    /// # Errors
    /// Returns the store error when the document exists but cannot be read.
    pub async fn load(
        store: Arc<dyn DocumentStore<DriveAccountsDocument>>,
        flow: Arc<dyn AuthorizationFlow>,
        gateway: Arc<dyn DriveGateway>,
        refresher: Arc<TokenRefreshEngine>,
    ) -> Result<Self> {
        let document = store.load().await?.unwrap_or_default();
        debug!(accounts = document.accounts.len(), "drive registry loaded");
        Ok(Self {
            store,
            flow,
            gateway,
            refresher,
            state: Mutex::new(document),
            profile_attempted: parking_lot::Mutex::new(HashSet::new()),
        })
    }

    fn vault(&self) -> &Arc<dyn CredentialVault> {
        self.refresher.vault()
    }

    /// All accounts with placeholder names normalized.
    pub async fn list(&self) -> Vec<DriveAccount> {
        self.state.lock().await.accounts.iter().map(DriveAccount::normalized).collect()
    }

    pub async fn get(&self, account_id: &str) -> Option<DriveAccount> {
        let state = self.state.lock().await;
        state.accounts.iter().find(|a| a.id == account_id).map(DriveAccount::normalized)
    }

    /// # Errors
    /// `AccountNotFound` when no account has this id.
    pub async fn require(&self, account_id: &str) -> Result<DriveAccount> {
        self.get(account_id)
            .await
            .ok_or_else(|| StreamSnapError::AccountNotFound(account_id.to_string()))
    }

    /// Accounts included in "save to all".
    pub async fn get_active(&self) -> Vec<DriveAccount> {
        self.list().await.into_iter().filter(|a| a.is_active).collect()
    }

    pub async fn default_account_id(&self) -> Option<String> {
        self.state.lock().await.default_account_id.clone()
    }

    async fn commit(
        &self,
        state: &mut DriveAccountsDocument,
        next: DriveAccountsDocument,
    ) -> Result<()> {
        self.store.save(&next).await?;
        *state = next;
        Ok(())
    }

    async fn delete_secret(&self, vault_key: &str) {
        if let Err(err) = self.vault().delete(vault_key).await {
            warn!(vault_key = %vault_key, error = %err, "failed to delete token bundle");
        }
    }

    /// Link a new account through the authorization flow.
    ///
    /// The flow runs without holding the registry lock; identity is checked
    /// under the lock so two concurrent links of the same email cannot both
    /// succeed.
    ///
    /// # Errors
    /// Flow errors, `VaultUnavailable` when the bundle cannot be stored,
    /// `DuplicateAccount` when the email is already linked, or the store
    /// error.
    pub async fn create(&self, display_name: Option<String>) -> Result<DriveAccount> {
        let bundle = self.flow.authorize().await?;

        let account_id = Uuid::new_v4().to_string();
        let vault_key = drive_vault_key(&account_id);
        self.vault()
            .put(&vault_key, &bundle)
            .await
            .map_err(|err| StreamSnapError::VaultUnavailable(err.to_string()))?;
        self.delete_secret(LEGACY_DRIVE_VAULT_KEY).await;

        let profile = match self.gateway.about_user(&bundle.access_token).await {
            Ok(profile) => Some(profile),
            Err(err) => {
                warn!(account_id = %account_id, error = %err, "profile lookup failed during link");
                None
            }
        };

        let mut state = self.state.lock().await;
        if let Some(email) = profile.as_ref().map(|p| p.email.as_str()) {
            let duplicate = state
                .accounts
                .iter()
                .any(|a| a.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)));
            if duplicate {
                drop(state);
                self.delete_secret(&vault_key).await;
                return Err(StreamSnapError::DuplicateAccount(email.to_string()));
            }
        }

        let created_at = now_millis();
        let account =
            DriveAccount::new(&account_id, &vault_key, profile.as_ref(), display_name, created_at);
        let mut next = state.clone();
        next.accounts.push(account.clone());
        if next.default_account_id.is_none() {
            next.default_account_id = Some(account_id.clone());
        }

        let committed = self.commit(&mut state, next).await;
        if let Err(err) = committed {
            drop(state);
            self.delete_secret(&vault_key).await;
            return Err(err);
        }

        info!(account_id = %account_id, "drive account linked");
        Ok(account)
    }

    /// Apply a partial preference patch.
    ///
    /// # Errors
    /// `AccountNotFound` or the store error.
    pub async fn update(
        &self,
        account_id: &str,
        patch: &DriveAccountPatch,
    ) -> Result<DriveAccount> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let account = next
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| StreamSnapError::AccountNotFound(account_id.to_string()))?;
        patch.apply(account, now_millis());
        let updated = account.normalized();

        self.commit(&mut state, next).await?;
        Ok(updated)
    }

    /// # Errors
    /// `AccountNotFound` or the store error.
    pub async fn set_default_folder(
        &self,
        account_id: &str,
        folder_id: Option<String>,
        folder_name: Option<String>,
    ) -> Result<DriveAccount> {
        let patch = DriveAccountPatch {
            default_folder_id: Some(folder_id),
            default_folder_name: Some(folder_name),
            ..DriveAccountPatch::default()
        };
        self.update(account_id, &patch).await
    }

    /// # Errors
    /// `AccountNotFound` or the store error.
    pub async fn mark_needs_reauth(&self, account_id: &str, needs: bool) -> Result<DriveAccount> {
        let patch = DriveAccountPatch { needs_reauth: Some(needs), ..DriveAccountPatch::default() };
        self.update(account_id, &patch).await
    }

    /// Remove the account and its secret.
    ///
    /// Secret deletion is best effort; the registry entry always goes.
    /// Returns `false` when the account did not exist.
    ///
    /// # Errors
    /// Returns the store error.
    pub async fn remove(&self, account_id: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        let Some(account) = state.accounts.iter().find(|a| a.id == account_id).cloned() else {
            return Ok(false);
        };

        self.delete_secret(&account.vault_key).await;

        let mut next = state.clone();
        next.accounts.retain(|a| a.id != account_id);
        if next.default_account_id.as_deref() == Some(account_id) {
            next.default_account_id = next.accounts.first().map(|a| a.id.clone());
        }
        self.commit(&mut state, next).await?;

        info!(account_id = %account_id, "drive account removed");
        Ok(true)
    }

    /// Turn a pre-multi-account secret into a registry entry.
    ///
    /// Runs only when the registry is empty and the legacy key holds a
    /// bundle. Returns whether a migration happened.
    ///
    /// # Errors
    /// `VaultUnavailable` when the bundle cannot be moved, or the store
    /// error.
    pub async fn migrate_legacy_tokens_if_needed(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.accounts.is_empty() {
            return Ok(false);
        }
        let Some(legacy) = self.vault().get(LEGACY_DRIVE_VAULT_KEY).await else {
            return Ok(false);
        };

        let account_id = Uuid::new_v4().to_string();
        let vault_key = drive_vault_key(&account_id);
        self.vault()
            .put(&vault_key, &legacy)
            .await
            .map_err(|err| StreamSnapError::VaultUnavailable(err.to_string()))?;
        self.delete_secret(LEGACY_DRIVE_VAULT_KEY).await;

        let profile = self.lookup_profile(&account_id, &vault_key).await;
        let account =
            DriveAccount::new(&account_id, &vault_key, profile.as_ref(), None, now_millis());

        let mut next = state.clone();
        next.accounts.push(account);
        next.default_account_id = Some(account_id.clone());
        self.commit(&mut state, next).await?;

        info!(account_id = %account_id, "legacy drive tokens migrated");
        Ok(true)
    }

    async fn lookup_profile(&self, account_id: &str, vault_key: &str) -> Option<DomainInfo> {
        let bundle = match self.refresher.ensure_valid(vault_key, REACTIVE_REFRESH_MARGIN_MS).await
        {
            Ok(bundle) => bundle,
            Err(err) => {
                debug!(account_id = %account_id, error = %err, "no usable token for profile");
                return None;
            }
        };
        match self.gateway.about_user(&bundle.access_token).await {
            Ok(profile) => Some(profile),
            Err(err) => {
                warn!(account_id = %account_id, error = %err, "profile lookup failed");
                None
            }
        }
    }

    /// Resolve missing emails and fix placeholder names.
    ///
    /// Each account is looked up at most once per process. Only tokens that
    /// are still valid are used; nothing is refreshed here. Returns how many
    /// accounts changed.
    pub async fn backfill_missing_profiles(&self) -> usize {
        let candidates: Vec<DriveAccount> = {
            let state = self.state.lock().await;
            let mut attempted = self.profile_attempted.lock();
            state
                .accounts
                .iter()
                .filter(|a| a.email.as_deref().map_or(true, str::is_empty))
                .filter(|a| attempted.insert(a.id.clone()))
                .cloned()
                .collect()
        };

        let mut resolved = Vec::new();
        for account in candidates {
            let Some(bundle) = self.vault().get(&account.vault_key).await else {
                continue;
            };
            if !bundle.is_valid(REACTIVE_REFRESH_MARGIN_MS) {
                debug!(account_id = %account.id, "skipping backfill, token stale");
                continue;
            }
            match self.gateway.about_user(&bundle.access_token).await {
                Ok(profile) => resolved.push((account.id, profile)),
                Err(err) => warn!(account_id = %account.id, error = %err, "backfill lookup failed"),
            }
        }

        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let mut changed = 0;
        for account in &mut next.accounts {
            if let Some((_, profile)) = resolved.iter().find(|(id, _)| *id == account.id) {
                account.apply_profile(profile);
                changed += 1;
            } else if account.email.is_some() && account.has_placeholder_name() {
                *account = account.normalized();
                changed += 1;
            }
        }
        if changed == 0 {
            return 0;
        }

        match self.commit(&mut state, next).await {
            Ok(()) => {
                info!(updated = changed, "drive profiles backfilled");
                changed
            }
            Err(err) => {
                warn!(error = %err, "failed to persist backfilled profiles");
                0
            }
        }
    }

    /// Proactive sweep: refresh every token expiring within five minutes.
    ///
    /// Per-account failures are logged and skipped. Accounts refreshed while
    /// flagged for reauth get the flag cleared. Returns the success count.
    pub async fn refresh_all_tokens(&self) -> usize {
        let accounts = self.list().await;
        let mut refreshed = 0;
        let mut recovered = Vec::new();

        for account in &accounts {
            match self
                .refresher
                .refresh_if_expiring(&account.vault_key, PROACTIVE_REFRESH_MARGIN_MS)
                .await
            {
                Ok(true) => {
                    refreshed += 1;
                    if account.needs_reauth {
                        recovered.push(account.id.clone());
                    }
                }
                Ok(false) => {}
                Err(err) => warn!(account_id = %account.id, error = %err, "sweep refresh failed"),
            }
        }

        for account_id in recovered {
            if let Err(err) = self.mark_needs_reauth(&account_id, false).await {
                warn!(account_id = %account_id, error = %err, "failed to clear reauth flag");
            }
        }

        info!(refreshed, total = accounts.len(), "drive token sweep finished");
        refreshed
    }

    /// Reactive recovery after an API call was rejected.
    ///
    /// On success the reauth flag is cleared; on failure it is set and the
    /// caller is told the account should be removed.
    pub async fn handle_auth_error(&self, account_id: &str) -> AuthRecovery {
        let Some(account) = self.get(account_id).await else {
            return AuthRecovery::remove("Account not found");
        };

        let recovery = self.refresher.recover(&account.vault_key).await;
        let needs_reauth = !recovery.refreshed;
        if account.needs_reauth != needs_reauth {
            if let Err(err) = self.mark_needs_reauth(account_id, needs_reauth).await {
                warn!(account_id = %account_id, error = %err, "failed to update reauth flag");
            }
        }
        recovery
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for drive::registry.
    use std::sync::atomic::Ordering;

    use streamsnap_common::testing::{MockOAuthClient, MockVault};
    use streamsnap_common::TokenBundle;

    use super::*;
    use crate::test_support::{fresh_bundle, FakeDrive, MemoryStore, ScriptedFlow};

    struct Harness {
        registry: DriveAccountRegistry,
        store: Arc<MemoryStore<DriveAccountsDocument>>,
        vault: MockVault,
        oauth: MockOAuthClient,
    }

    async fn harness(
        document: Option<DriveAccountsDocument>,
        flow: Arc<ScriptedFlow>,
        gateway: Arc<FakeDrive>,
    ) -> Harness {
        let store = MemoryStore::new(document);
        let vault = MockVault::new();
        let oauth = MockOAuthClient::new();
        let refresher =
            Arc::new(TokenRefreshEngine::new(Arc::new(vault.clone()), Arc::new(oauth.clone())));
        let registry = DriveAccountRegistry::load(store.clone(), flow, gateway, refresher)
            .await
            .expect("load should succeed");
        Harness { registry, store, vault, oauth }
    }

    /// Validates `create` stores the secret and derives the profile.
    ///
    /// Assertions:
    /// - Confirms the vault key is namespaced by account id.
    /// - Confirms the first account becomes the default.
    /// - Confirms the legacy key is cleared.
    #[tokio::test]
    async fn test_create_links_account() {
        let h = harness(
            None,
            ScriptedFlow::granting(vec![fresh_bundle("t1")]),
            FakeDrive::with_user("t1", "jane@acme.io"),
        )
        .await;
        h.vault.seed(LEGACY_DRIVE_VAULT_KEY, fresh_bundle("old"));

        let account = h.registry.create(None).await.unwrap();

        assert_eq!(account.vault_key, format!("drive_tokens:{}", account.id));
        assert_eq!(account.email.as_deref(), Some("jane@acme.io"));
        assert_eq!(account.display_name, "jane");
        assert!(account.is_organizational && account.is_active);
        assert!(h.vault.contains(&account.vault_key));
        assert!(!h.vault.contains(LEGACY_DRIVE_VAULT_KEY));
        assert_eq!(h.registry.default_account_id().await, Some(account.id.clone()));
        assert_eq!(h.store.snapshot().unwrap().accounts.len(), 1);
    }

    /// Validates duplicate identity is rejected without leaking a secret.
    ///
    /// Assertions:
    /// - Ensures the second link fails with `DuplicateAccount`.
    /// - Ensures exactly one entry and one secret remain.
    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let gateway = FakeDrive::with_user("t1", "jane@acme.io");
        gateway.add_user("t2", "Jane@acme.io");
        let h = harness(
            None,
            ScriptedFlow::granting(vec![fresh_bundle("t1"), fresh_bundle("t2")]),
            gateway,
        )
        .await;

        h.registry.create(None).await.unwrap();
        let err = h.registry.create(None).await.unwrap_err();

        assert_eq!(err, StreamSnapError::DuplicateAccount("Jane@acme.io".into()));
        assert_eq!(h.registry.list().await.len(), 1);
        assert_eq!(h.vault.keys().len(), 1);
    }

    /// Validates two links of the same email racing each other register once.
    ///
    /// Assertions:
    /// - Confirms exactly one link fails with `DuplicateAccount`.
    /// - Confirms the registry holds a single account.
    /// - Confirms only the winner's vault key survives.
    #[tokio::test]
    async fn test_concurrent_links_of_same_email_register_once() {
        let gateway = FakeDrive::with_user("t1", "jane@acme.io");
        gateway.add_user("t2", "jane@acme.io");
        let h = harness(
            None,
            ScriptedFlow::granting(vec![fresh_bundle("t1"), fresh_bundle("t2")]),
            gateway,
        )
        .await;

        let (first, second) = tokio::join!(h.registry.create(None), h.registry.create(None));

        let (winner, loser) = match (first, second) {
            (Ok(account), Err(err)) | (Err(err), Ok(account)) => (account, err),
            other => panic!("expected one link to win, got {other:?}"),
        };
        assert_eq!(loser, StreamSnapError::DuplicateAccount("jane@acme.io".into()));
        let accounts = h.registry.list().await;
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, winner.id);
        assert_eq!(h.vault.keys(), vec![winner.vault_key.clone()]);
    }

    /// Validates flow and vault failures abort before any registry write.
    ///
    /// Assertions:
    /// - Confirms a flow timeout surfaces unchanged.
    /// - Confirms a vault failure maps to `VaultUnavailable`.
    #[tokio::test]
    async fn test_create_failures_leave_registry_untouched() {
        let h = harness(
            None,
            ScriptedFlow::granting(vec![fresh_bundle("t1")]),
            FakeDrive::with_user("t1", "a@gmail.com"),
        )
        .await;
        h.vault.set_fail_put(true);

        let err = h.registry.create(None).await.unwrap_err();
        assert!(matches!(err, StreamSnapError::VaultUnavailable(_)));
        assert_eq!(h.registry.create(None).await.unwrap_err(), StreamSnapError::AuthTimeout);
        assert_eq!(h.store.save_count(), 0);
    }

    /// Validates a failed document write rolls back memory and the secret.
    ///
    /// Assertions:
    /// - Ensures the in-memory list stays empty.
    /// - Ensures the stored secret is deleted again.
    #[tokio::test]
    async fn test_create_store_failure_rolls_back() {
        let h = harness(
            None,
            ScriptedFlow::granting(vec![fresh_bundle("t1")]),
            FakeDrive::with_user("t1", "a@gmail.com"),
        )
        .await;
        h.store.fail_save.store(true, Ordering::SeqCst);

        assert!(matches!(h.registry.create(None).await, Err(StreamSnapError::Storage(_))));
        assert!(h.registry.list().await.is_empty());
        assert!(h.vault.keys().is_empty());
    }

    fn account(id: &str, email: Option<&str>) -> DriveAccount {
        let profile = email.and_then(DomainInfo::from_email);
        DriveAccount::new(id, drive_vault_key(id), profile.as_ref(), None, 1)
    }

    fn document(accounts: Vec<DriveAccount>) -> DriveAccountsDocument {
        let default_account_id = accounts.first().map(|a| a.id.clone());
        DriveAccountsDocument { accounts, default_account_id }
    }

    /// Validates `remove` is eventually consistent when secret deletion
    /// fails.
    ///
    /// Assertions:
    /// - Confirms the entry is gone and excluded from active accounts.
    /// - Confirms the default moves to the next account.
    /// - Confirms removing again reports `false`.
    #[tokio::test]
    async fn test_remove_survives_vault_failure() {
        let h = harness(
            Some(document(vec![account("a1", Some("a@gmail.com")), account("a2", None)])),
            ScriptedFlow::granting(vec![]),
            Arc::new(FakeDrive::default()),
        )
        .await;
        h.vault.set_fail_delete(true);

        assert!(h.registry.remove("a1").await.unwrap());
        assert!(h.registry.get("a1").await.is_none());
        assert!(h.registry.get_active().await.iter().all(|a| a.id != "a1"));
        assert_eq!(h.registry.default_account_id().await.as_deref(), Some("a2"));
        assert!(!h.registry.remove("a1").await.unwrap());
    }

    /// Validates `update`, `set_default_folder` and `mark_needs_reauth`.
    ///
    /// Assertions:
    /// - Ensures unknown ids yield `AccountNotFound`.
    /// - Ensures patches persist and keep immutable fields.
    #[tokio::test]
    async fn test_update_helpers() {
        let h = harness(
            Some(document(vec![account("a1", None)])),
            ScriptedFlow::granting(vec![]),
            Arc::new(FakeDrive::default()),
        )
        .await;

        let folder = Some("f9".into());
        let updated =
            h.registry.set_default_folder("a1", folder, Some("Clips".into())).await.unwrap();
        assert_eq!(updated.default_folder_id.as_deref(), Some("f9"));
        assert_eq!(updated.vault_key, "drive_tokens:a1");

        let flagged = h.registry.mark_needs_reauth("a1", true).await.unwrap();
        assert!(flagged.needs_reauth);
        assert!(h.store.snapshot().unwrap().accounts[0].needs_reauth);

        let err = h.registry.mark_needs_reauth("zz", true).await.unwrap_err();
        assert_eq!(err, StreamSnapError::AccountNotFound("zz".into()));
    }

    /// Validates legacy migration runs exactly once.
    ///
    /// Assertions:
    /// - Confirms one account is synthesized with the resolved email.
    /// - Confirms the legacy key no longer resolves.
    /// - Confirms a second call is a no-op.
    #[tokio::test]
    async fn test_migrate_legacy_tokens_once() {
        let h = harness(
            None,
            ScriptedFlow::granting(vec![]),
            FakeDrive::with_user("legacy", "old@gmail.com"),
        )
        .await;
        h.vault.seed(LEGACY_DRIVE_VAULT_KEY, fresh_bundle("legacy"));

        assert!(h.registry.migrate_legacy_tokens_if_needed().await.unwrap());
        let accounts = h.registry.list().await;
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].email.as_deref(), Some("old@gmail.com"));
        assert!(h.vault.contains(&accounts[0].vault_key));
        assert!(!h.vault.contains(LEGACY_DRIVE_VAULT_KEY));

        h.vault.seed(LEGACY_DRIVE_VAULT_KEY, fresh_bundle("legacy"));
        assert!(!h.registry.migrate_legacy_tokens_if_needed().await.unwrap());
        assert_eq!(h.registry.list().await.len(), 1);
    }

    /// Validates backfill resolves each account at most once.
    ///
    /// Assertions:
    /// - Confirms a valid-token account gets its email.
    /// - Confirms a stale-token account is skipped without refresh.
    /// - Confirms a second pass makes no gateway calls.
    #[tokio::test]
    async fn test_backfill_missing_profiles() {
        let gateway = FakeDrive::with_user("good", "bob@acme.io");
        let h = harness(
            Some(document(vec![account("a1", None), account("a2", None)])),
            ScriptedFlow::granting(vec![]),
            gateway.clone(),
        )
        .await;
        h.vault.seed("drive_tokens:a1", fresh_bundle("good"));
        h.vault.seed("drive_tokens:a2", TokenBundle::new("stale", Some("r".into()), Some(1)));

        assert_eq!(h.registry.backfill_missing_profiles().await, 1);
        let a1 = h.registry.get("a1").await.unwrap();
        assert_eq!(a1.email.as_deref(), Some("bob@acme.io"));
        assert_eq!(a1.display_name, "bob");
        assert_eq!(h.oauth.refresh_count(), 0);

        let calls = gateway.calls.load(Ordering::SeqCst);
        assert_eq!(h.registry.backfill_missing_profiles().await, 0);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), calls);
    }

    /// Validates the proactive sweep counts and clears reauth flags.
    ///
    /// Assertions:
    /// - Confirms only the expiring account is refreshed.
    /// - Confirms its `needs_reauth` flag is cleared.
    #[tokio::test]
    async fn test_refresh_all_tokens() {
        let mut expiring = account("a1", None);
        expiring.needs_reauth = true;
        let h = harness(
            Some(document(vec![expiring, account("a2", None), account("a3", None)])),
            ScriptedFlow::granting(vec![]),
            Arc::new(FakeDrive::default()),
        )
        .await;
        let expiring = TokenBundle::new("t", Some("r".into()), Some(now_millis() + 1_000));
        h.vault.seed("drive_tokens:a1", expiring);
        h.vault.seed("drive_tokens:a2", fresh_bundle("ok"));

        assert_eq!(h.registry.refresh_all_tokens().await, 1);
        assert_eq!(h.oauth.refresh_count(), 1);
        assert!(!h.registry.get("a1").await.unwrap().needs_reauth);
    }

    /// Validates reactive recovery flags.
    ///
    /// Assertions:
    /// - Ensures a failed refresh sets `needs_reauth` and asks for removal.
    /// - Ensures a later success clears the flag.
    /// - Ensures unknown accounts ask for removal.
    #[tokio::test]
    async fn test_handle_auth_error() {
        let h = harness(
            Some(document(vec![account("a1", None)])),
            ScriptedFlow::granting(vec![]),
            Arc::new(FakeDrive::default()),
        )
        .await;
        h.vault.seed("drive_tokens:a1", fresh_bundle("t"));
        h.oauth.set_should_fail(true);

        let failed = h.registry.handle_auth_error("a1").await;
        assert!(failed.should_remove);
        assert!(h.registry.get("a1").await.unwrap().needs_reauth);
        assert!(h.registry.get("a1").await.is_some());

        h.oauth.set_should_fail(false);
        assert!(h.registry.handle_auth_error("a1").await.refreshed);
        assert!(!h.registry.get("a1").await.unwrap().needs_reauth);

        let missing = h.registry.handle_auth_error("nope").await;
        assert_eq!(missing.reason.as_deref(), Some("Account not found"));
    }
}
