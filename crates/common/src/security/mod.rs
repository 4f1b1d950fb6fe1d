//! Security primitives
//!
//! Platform keychain access. Token-specific storage lives in
//! `auth::keychain` on top of this provider.

pub mod keychain;

pub use keychain::{KeychainError, KeychainProvider};
