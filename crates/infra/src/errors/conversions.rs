//! Conversions from external infrastructure errors into domain errors.

use keyring::Error as KeyringError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use std::io::Error as IoError;
use streamsnap_domain::StreamSnapError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub StreamSnapError);

impl From<InfraError> for StreamSnapError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<StreamSnapError> for InfraError {
    fn from(value: StreamSnapError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoStreamSnapError {
    fn into_streamsnap(self) -> StreamSnapError;
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → StreamSnapError */
/* -------------------------------------------------------------------------- */

impl IntoStreamSnapError for KeyringError {
    fn into_streamsnap(self) -> StreamSnapError {
        use KeyringError::*;

        let description = self.to_string();

        match self {
            NoEntry => StreamSnapError::NotAuthenticated,
            BadEncoding(_) => {
                StreamSnapError::VaultUnavailable("keychain credential is not valid UTF-8".into())
            }
            PlatformFailure(err) => {
                StreamSnapError::VaultUnavailable(format!("keychain platform error: {err}"))
            }
            NoStorageAccess(err) => {
                StreamSnapError::VaultUnavailable(format!("unable to access secure storage: {err}"))
            }
            _ => StreamSnapError::VaultUnavailable(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_streamsnap())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → StreamSnapError */
/* -------------------------------------------------------------------------- */

impl IntoStreamSnapError for HttpError {
    fn into_streamsnap(self) -> StreamSnapError {
        if self.is_timeout() {
            return StreamSnapError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return StreamSnapError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return StreamSnapError::ProviderApi {
                status: status.as_u16(),
                body: status.canonical_reason().unwrap_or("unknown status").to_string(),
            };
        }

        if self.is_decode() {
            return StreamSnapError::Internal(format!("malformed provider response: {self}"));
        }

        StreamSnapError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_streamsnap())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error / serde_json::Error → StreamSnapError */
/* -------------------------------------------------------------------------- */

impl IntoStreamSnapError for IoError {
    fn into_streamsnap(self) -> StreamSnapError {
        StreamSnapError::Storage(self.to_string())
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_streamsnap())
    }
}

impl IntoStreamSnapError for JsonError {
    fn into_streamsnap(self) -> StreamSnapError {
        StreamSnapError::Storage(format!("invalid JSON document: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_streamsnap())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn keyring_no_entry_maps_to_not_authenticated() {
        let mapped: StreamSnapError = InfraError::from(KeyringError::NoEntry).into();
        assert_eq!(mapped, StreamSnapError::NotAuthenticated);
    }

    #[test]
    fn io_error_maps_to_storage() {
        let err = IoError::new(std::io::ErrorKind::PermissionDenied, "denied");
        let mapped: StreamSnapError = InfraError::from(err).into();
        assert!(matches!(mapped, StreamSnapError::Storage(msg) if msg.contains("denied")));
    }

    #[test]
    fn json_error_maps_to_storage() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let mapped: StreamSnapError = InfraError::from(err).into();
        assert!(matches!(mapped, StreamSnapError::Storage(_)));
    }

    #[tokio::test]
    async fn http_status_401_maps_to_provider_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: StreamSnapError = InfraError::from(error).into();
        assert!(mapped.is_auth_rejection());
    }
}
