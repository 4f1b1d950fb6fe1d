//! Traits for OAuth and credential storage operations
//!
//! These traits enable dependency injection and testing by abstracting
//! external dependencies (OAuth token endpoints, secret stores).

use async_trait::async_trait;
use thiserror::Error;

use super::client::OAuthClientError;
use super::types::{TokenBundle, TokenResponse};

/// Token endpoint operations.
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    /// Returns error if the token endpoint rejects the code or is unreachable
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, OAuthClientError>;

    /// Refresh access token using refresh token
    ///
    /// # Errors
    /// Returns error if refresh fails or token is invalid/revoked
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError>;
}

/// Failure of the underlying secret store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VaultError {
    /// Secret store could not be reached or refused the operation
    #[error("secret store unavailable: {0}")]
    Unavailable(String),

    /// Bundle could not be serialized
    #[error("failed to serialize token bundle: {0}")]
    Serialization(String),
}

/// Capability-keyed storage for token bundles.
///
/// Contract:
/// - `put` may fail; callers treat failure as best effort.
/// - `get` never fails: a missing or corrupt entry is `None`.
/// - `delete` is idempotent; a missing key is success.
#[async_trait]
pub trait CredentialVault: Send + Sync {
    /// Store (or overwrite) the bundle under `key`.
    ///
    /// # Errors
    /// Returns `VaultError` if the secret store rejects the write
    async fn put(&self, key: &str, bundle: &TokenBundle) -> Result<(), VaultError>;

    /// Load the bundle stored under `key`.
    async fn get(&self, key: &str) -> Option<TokenBundle>;

    /// Remove the bundle stored under `key`.
    ///
    /// # Errors
    /// Returns `VaultError` only for store failures, never for a missing key
    async fn delete(&self, key: &str) -> Result<(), VaultError>;
}
