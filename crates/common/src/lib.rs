//! Common building blocks shared across StreamSnap crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: token bundle types and PKCE helpers (no I/O)
//! - `platform`: OAuth token endpoint client, credential vault contract, OS
//!   keychain provider
//! - `test-utils`: in-memory mocks for the platform traits

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation + platform tiers
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod auth;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod security;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "test-utils")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use auth::{PkceChallenge, TokenBundle, TokenResponse};
#[cfg(feature = "platform")]
pub use auth::{CredentialVault, OAuthClient, OAuthClientError, OAuthClientTrait, VaultError};
#[cfg(feature = "platform")]
pub use security::{KeychainError, KeychainProvider};
