//! Token lifecycle shared by the Drive and YouTube clients
//!
//! - [`ports`]: the interactive authorization seam
//! - [`refresh`]: staleness checks, refresh, recovery and the
//!   retry-once-on-401 call wrapper

pub mod ports;
pub mod refresh;

pub use refresh::{with_access_token, TokenRefreshEngine};
