//! # StreamSnap Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Loopback OAuth flow (callback server + browser launcher)
//! - JSON document store and the keychain-backed credential vault
//! - Google Drive and YouTube REST gateways
//! - HTTP client with retry support
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `streamsnap-core`
//! - Depends on `streamsnap-common`, `streamsnap-domain` and `streamsnap-core`
//! - Contains all "impure" code (I/O, network, keychain)

pub mod config;
pub mod errors;
pub mod google;
pub mod http;
pub mod oauth;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used items
pub use errors::InfraError;
pub use google::{GoogleDriveGateway, GoogleYouTubeGateway};
pub use http::{HttpClient, HttpClientBuilder};
pub use oauth::{BrowserLauncher, LoopbackAuthorizationFlow, OAuthCallbackServer, SystemBrowser};
pub use storage::{JsonFileStore, KeychainVault};
