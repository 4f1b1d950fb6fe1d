//! Command plumbing shared by the boundary commands

pub mod command_helpers;
pub mod logging;
