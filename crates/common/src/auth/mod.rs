//! OAuth 2.0 + PKCE building blocks
//!
//! Shared by the Drive and YouTube integrations. Everything here is
//! provider-agnostic: endpoints and scopes come from [`OAuthConfig`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  AuthorizationFlow   │  (infra: loopback listener + browser)
//! └─────────┬────────────┘
//!           │
//!           ├──► PKCE utilities     (challenge generation)
//!           ├──► OAuthClient        (token endpoint grants)
//!           │
//! ┌─────────▼────────────┐
//! │ TokenRefreshEngine   │  (core: staleness + refresh)
//! └─────────┬────────────┘
//!           └──► CredentialVault    (KeychainProvider or mocks)
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: `TokenBundle`, `TokenResponse`, `OAuthConfig`
//! - **[`pkce`]**: PKCE challenge generation
//! - **`client`**: token endpoint client (platform tier)
//! - **`traits`**: `OAuthClientTrait`, `CredentialVault` (platform tier)

pub mod pkce;
pub mod types;

#[cfg(feature = "platform")]
pub mod client;
#[cfg(feature = "platform")]
mod keychain;
#[cfg(feature = "platform")]
pub mod traits;

#[cfg(feature = "platform")]
pub use client::{OAuthClient, OAuthClientError};
pub use pkce::{generate_code_challenge, generate_code_verifier, generate_state, PkceChallenge};
#[cfg(feature = "platform")]
pub use traits::{CredentialVault, OAuthClientTrait, VaultError};
pub use types::{now_millis, OAuthConfig, OAuthError, TokenBundle, TokenResponse};
