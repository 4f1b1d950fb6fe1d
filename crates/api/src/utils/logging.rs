use std::time::Duration;

use streamsnap_domain::StreamSnapError;
use tracing::{info, warn};

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"drive::list_accounts"`).
/// * `elapsed` - Duration the command execution took.
/// * `error` - The failure, if the command failed.
///
/// Only the error label is logged; messages can echo provider bodies.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, error: Option<&StreamSnapError>) {
    let duration_ms = elapsed.as_millis() as u64;

    match error {
        None => info!(command, duration_ms, "command_execution_success"),
        Some(err) => {
            warn!(command, duration_ms, error_label = error_label(err), "command_execution_failure")
        }
    }
}

/// Convert a `StreamSnapError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &StreamSnapError) -> &'static str {
    error.kind()
}
