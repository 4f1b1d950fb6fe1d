//! Google REST gateways
//!
//! Thin adapters from the core gateway ports to the Drive v3 and YouTube
//! Data v3 APIs. They work with raw access tokens; account resolution and
//! token refresh live in core.

pub mod drive;
pub mod youtube;

pub use drive::GoogleDriveGateway;
pub use youtube::GoogleYouTubeGateway;
