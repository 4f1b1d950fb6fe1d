//! Testing utilities and helpers
//!
//! In-memory stand-ins for the platform traits so higher crates can test
//! refresh, account and upload logic without a keychain or network.
//!
//! ## Usage
//!
//! ```rust
//! use streamsnap_common::testing::{MockOAuthClient, MockVault};
//!
//! let vault = MockVault::new();
//! let oauth = MockOAuthClient::new();
//! assert_eq!(vault.put_count(), 0);
//! assert_eq!(oauth.refresh_count(), 0);
//! ```

pub mod mocks;

pub use mocks::{MockOAuthClient, MockVault};
