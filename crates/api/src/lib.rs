//! # StreamSnap App
//!
//! Application layer - boundary commands and the CLI entry point.
//!
//! This crate contains:
//! - Commands (UI/CLI → backend bridge) returning JSON envelopes
//! - Application context (dependency injection)
//! - Command logging helpers
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
