//! YouTube channels and API client
//!
//! - [`ports`]: the REST gateway seam
//! - [`registry`]: linked channels with upsert-on-relink semantics
//! - [`service`]: sign-in, channel, playlist and upload operations

pub mod ports;
pub mod registry;
pub mod service;

pub use registry::YouTubeAccountRegistry;
pub use service::YouTubeService;
