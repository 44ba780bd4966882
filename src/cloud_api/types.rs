use serde::{Deserialize, Serialize};
use std::fmt;

/// Stratus SDK error type
///
/// Represents all possible errors that can occur when interacting with
/// the Stratus cloud API or performing related operations.
#[derive(Debug)]
pub enum SdkError {
    /// API request failed (network, HTTP, or response parsing error)
    Api(ApiError),
    /// Session store operation failed
    Session(crate::session::SessionError),
    /// Persistent storage operation failed
    Storage(crate::storage::StorageError),
    /// Configuration error (missing endpoint template, unreadable file)
    Config(String),
}

impl fmt::Display for SdkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdkError::Api(err) => write!(f, "API error: {}", err),
            SdkError::Session(err) => write!(f, "Session error: {}", err),
            SdkError::Storage(err) => write!(f, "Storage error: {}", err),
            SdkError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for SdkError {}

impl From<ApiError> for SdkError {
    fn from(err: ApiError) -> Self {
        SdkError::Api(err)
    }
}

impl From<crate::session::SessionError> for SdkError {
    fn from(err: crate::session::SessionError) -> Self {
        SdkError::Session(err)
    }
}

impl From<crate::storage::StorageError> for SdkError {
    fn from(err: crate::storage::StorageError) -> Self {
        SdkError::Storage(err)
    }
}

/// API-specific errors
#[derive(Debug)]
pub enum ApiError {
    /// Network error (connection, timeout, etc.)
    Network(String),
    /// HTTP error with status code
    Http { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Request building failed
    Request(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Http { status, message } => {
                write!(f, "HTTP {} error: {}", status, message)
            }
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ApiError::Request(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timeout".to_string())
        } else if err.is_connect() {
            ApiError::Network(format!("Connection failed: {}", err))
        } else if let Some(status) = err.status() {
            ApiError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Response body of the token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokenResponse {
    pub token: String,
}

/// Response body of the token-info endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfoResponse {
    pub expire: Option<String>,
    #[serde(default)]
    pub payload: Option<TokenPayload>,
}

/// Claims echoed back by the token-info endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Subject (user id)
    pub sub: Option<String>,
}

/// Fields extracted from account create/get responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: String,
    pub name: String,
}

/// Fields extracted from the device-activation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceActivation {
    #[serde(rename = "deviceToken")]
    pub device_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = ApiError::Http {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 401 error: unauthorized");

        let err = ApiError::Network("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn sdk_error_wraps_api_error() {
        let err: SdkError = ApiError::Parse("bad json".to_string()).into();
        assert!(matches!(err, SdkError::Api(ApiError::Parse(_))));
    }

    #[test]
    fn account_info_deserializes() {
        let info: AccountInfo =
            serde_json::from_str(r#"{"id":"acc-1","name":"home","healthTimePeriod":86400}"#)
                .unwrap();
        assert_eq!(info.id, "acc-1");
        assert_eq!(info.name, "home");
    }

    #[test]
    fn device_activation_uses_wire_field_name() {
        let act: DeviceActivation =
            serde_json::from_str(r#"{"deviceToken":"dt-123"}"#).unwrap();
        assert_eq!(act.device_token, "dt-123");
    }
}
