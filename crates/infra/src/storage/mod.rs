//! Local persistence adapters
//!
//! - [`json_store`]: atomic JSON documents for the account registries
//! - [`vault`]: keychain-backed credential vault with the Drive fallback file

pub mod json_store;
pub mod vault;

pub use json_store::JsonFileStore;
pub use vault::KeychainVault;
