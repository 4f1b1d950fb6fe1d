//! # StreamSnap Domain
//!
//! Business domain types and models for StreamSnap.
//!
//! This crate contains:
//! - Linked account records for Drive and YouTube
//! - Drive/YouTube request and result value types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants (Google endpoints, scopes, vault keys)
//!
//! ## Architecture
//! - No dependencies on other StreamSnap crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
