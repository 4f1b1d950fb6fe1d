//! # StreamSnap Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for storage, authorization and the
//!   Google APIs
//! - The token refresh engine
//! - Drive and YouTube account registries
//! - Drive and YouTube provider clients
//!
//! ## Architecture Principles
//! - Only depends on `streamsnap-common` and `streamsnap-domain`
//! - No filesystem, HTTP, or keychain code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod auth;
pub mod drive;
pub mod youtube;

// Infrastructure ports
pub mod storage_ports;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export specific items to avoid ambiguity
pub use auth::ports::AuthorizationFlow;
pub use auth::TokenRefreshEngine;
pub use drive::ports::{DriveGateway, UploadedFile};
pub use drive::{DriveAccountRegistry, DriveService};
pub use storage_ports::DocumentStore;
pub use youtube::ports::YouTubeGateway;
pub use youtube::{YouTubeAccountRegistry, YouTubeService};
