//! Command execution helpers
//!
//! Every boundary command runs through [`execute_command`], which times the
//! call, logs the outcome and folds the result into a [`CommandResponse`].

use std::future::Future;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use streamsnap_domain::{Result as DomainResult, StreamSnapError};

use crate::utils::logging::log_command_execution;

/// Envelope returned by every command.
///
/// Serializes as `{"success":true, ...payload}` or
/// `{"success":false,"error":"..."}`. Payloads must serialize as objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> CommandResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn failure(error: &StreamSnapError) -> Self {
        Self { success: false, data: None, error: Some(error.to_string()) }
    }

    pub fn from_result(result: DomainResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failure(&err),
        }
    }

    /// The payload, or the error message.
    pub fn into_result(self) -> std::result::Result<T, String> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(error)) => Err(error),
            (None, None) => Err("empty command response".to_string()),
        }
    }
}

/// Execute a command with timing and structured logging.
///
/// # Example
///
/// ```rust,ignore
/// pub async fn drive_list_accounts(ctx: &AppContext) -> CommandResponse<AccountsPayload> {
///     execute_command("drive::list_accounts", || async {
///         Ok(AccountsPayload { accounts: ctx.drive.registry().list().await })
///     })
///     .await
/// }
/// ```
pub async fn execute_command<F, Fut, T>(command_name: &str, command_fn: F) -> CommandResponse<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();

    let result = command_fn().await;

    log_command_execution(command_name, start.elapsed(), result.as_ref().err());
    CommandResponse::from_result(result)
}
