//! Keychain-backed credential vault.
//!
//! Wraps the OS keychain and, for the primary Drive key only, mirrors the
//! bundle into a plain fallback file in the data directory. The file is
//! read when the keychain has nothing (or fails) for that key. Namespaced
//! multi-account keys never touch the file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use streamsnap_common::{CredentialVault, KeychainProvider, TokenBundle, VaultError};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct FallbackFile {
    path: PathBuf,
    primary_key: String,
}

/// Credential vault used by the app.
pub struct KeychainVault {
    inner: Arc<dyn CredentialVault>,
    fallback: Option<FallbackFile>,
}

impl KeychainVault {
    /// Vault on the OS keychain under `service`.
    pub fn new(service: impl Into<String>) -> Self {
        Self::from_inner(Arc::new(KeychainProvider::new(service)))
    }

    /// Vault over any secret store.
    pub fn from_inner(inner: Arc<dyn CredentialVault>) -> Self {
        Self { inner, fallback: None }
    }

    /// Mirror `primary_key` into `path`.
    #[must_use]
    pub fn with_fallback(
        mut self,
        path: impl Into<PathBuf>,
        primary_key: impl Into<String>,
    ) -> Self {
        self.fallback = Some(FallbackFile { path: path.into(), primary_key: primary_key.into() });
        self
    }

    fn fallback_for(&self, key: &str) -> Option<&FallbackFile> {
        self.fallback.as_ref().filter(|file| file.primary_key == key)
    }
}

async fn write_fallback(path: &Path, bundle: &TokenBundle) -> Result<(), VaultError> {
    let payload =
        serde_json::to_vec_pretty(bundle).map_err(|e| VaultError::Serialization(e.to_string()))?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| VaultError::Unavailable(e.to_string()))?;
    }
    tokio::fs::write(path, payload).await.map_err(|e| VaultError::Unavailable(e.to_string()))?;
    restrict_permissions(path).await;
    Ok(())
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let perms = std::fs::Permissions::from_mode(0o600);
    if let Err(err) = tokio::fs::set_permissions(path, perms).await {
        warn!(path = %path.display(), error = %err, "could not restrict fallback token file");
    }
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) {}

async fn read_fallback(path: &Path) -> Option<TokenBundle> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "fallback token file unreadable");
            return None;
        }
    };
    match serde_json::from_slice(&raw) {
        Ok(bundle) => Some(bundle),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring corrupt fallback token file");
            None
        }
    }
}

#[async_trait]
impl CredentialVault for KeychainVault {
    async fn put(&self, key: &str, bundle: &TokenBundle) -> Result<(), VaultError> {
        let stored = self.inner.put(key, bundle).await;

        let Some(file) = self.fallback_for(key) else {
            return stored;
        };

        match (stored, write_fallback(&file.path, bundle).await) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(err)) => {
                warn!(error = %err, "fallback token copy not written");
                Ok(())
            }
            (Err(err), Ok(())) => {
                warn!(key = %key, error = %err, "keychain write failed; using fallback file");
                Ok(())
            }
            (Err(err), Err(_)) => Err(err),
        }
    }

    async fn get(&self, key: &str) -> Option<TokenBundle> {
        if let Some(bundle) = self.inner.get(key).await {
            return Some(bundle);
        }
        let file = self.fallback_for(key)?;
        let bundle = read_fallback(&file.path).await;
        if bundle.is_some() {
            debug!(key = %key, "token bundle served from fallback file");
        }
        bundle
    }

    async fn delete(&self, key: &str) -> Result<(), VaultError> {
        let deleted = self.inner.delete(key).await;

        if let Some(file) = self.fallback_for(key) {
            match tokio::fs::remove_file(&file.path).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %file.path.display(), error = %err, "fallback file not removed");
                }
            }
        }
        deleted
    }
}
