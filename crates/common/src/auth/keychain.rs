//! Token bundle storage layered on top of `KeychainProvider`.
//!
//! One keychain entry per vault key holds the bundle as JSON. Keyring calls
//! block, so every operation hops onto the blocking pool.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::auth::traits::{CredentialVault, VaultError};
use crate::auth::types::TokenBundle;
use crate::security::{KeychainError, KeychainProvider};

impl From<KeychainError> for VaultError {
    fn from(err: KeychainError) -> Self {
        match err {
            KeychainError::Serialization(msg) => Self::Serialization(msg),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

async fn blocking<T, F>(keychain: &KeychainProvider, op: F) -> Result<T, KeychainError>
where
    T: Send + 'static,
    F: FnOnce(KeychainProvider) -> Result<T, KeychainError> + Send + 'static,
{
    let keychain = keychain.clone();
    tokio::task::spawn_blocking(move || op(keychain))
        .await
        .map_err(|e| KeychainError::AccessFailed(format!("keychain task failed: {e}")))?
}

#[async_trait]
impl CredentialVault for KeychainProvider {
    async fn put(&self, key: &str, bundle: &TokenBundle) -> Result<(), VaultError> {
        let payload = serde_json::to_string(bundle)
            .map_err(|e| VaultError::Serialization(e.to_string()))?;
        let key = key.to_string();

        blocking(self, move |keychain| keychain.set_secret(&key, &payload)).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Option<TokenBundle> {
        let owned = key.to_string();
        let raw = match blocking(self, move |keychain| keychain.get_secret(&owned)).await {
            Ok(raw) => raw,
            Err(KeychainError::NotFound) => return None,
            Err(err) => {
                warn!(key = %key, error = %err, "keychain read failed");
                return None;
            }
        };

        match serde_json::from_str::<TokenBundle>(&raw) {
            Ok(bundle) => Some(bundle),
            Err(err) => {
                warn!(key = %key, error = %err, "ignoring corrupt token bundle");
                None
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), VaultError> {
        debug!(key = %key, "deleting token bundle");
        let key = key.to_string();
        blocking(self, move |keychain| keychain.delete_secret(&key)).await?;
        Ok(())
    }
}
