//! Google Drive accounts and API client
//!
//! - [`ports`]: the REST gateway seam
//! - [`registry`]: linked accounts, legacy migration, profile backfill
//! - [`service`]: authenticated folder, upload and privacy operations

pub mod ports;
pub mod registry;
pub mod service;

pub use registry::DriveAccountRegistry;
pub use service::DriveService;
