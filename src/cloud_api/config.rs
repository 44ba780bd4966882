use crate::cloud_api::types::SdkError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Logical endpoint names
///
/// Keys into the endpoint-template table. Every endpoint module addresses
/// its URL templates through these names rather than literal paths.
pub mod endpoint {
    pub const AUTH_TOKEN: &str = "auth.token";
    pub const AUTH_TOKEN_INFO: &str = "auth.token_info";
    pub const ACCOUNT_CREATE: &str = "account.create";
    pub const ACCOUNT_ONE: &str = "account.one";
    pub const ACCOUNT_ACTIVATION_CODE: &str = "account.activation_code";
    pub const ACCOUNT_ACTIVATION_CODE_REFRESH: &str = "account.activation_code_refresh";
    pub const DEVICE_LIST: &str = "device.list";
    pub const DEVICE_ONE: &str = "device.one";
    pub const DEVICE_ACTIVATION: &str = "device.activation";
    pub const DEVICE_COMPONENTS: &str = "device.components";
    pub const DEVICE_COMPONENT_ONE: &str = "device.component_one";
    pub const COMPONENT_CATALOG: &str = "component.catalog";
    pub const USER_CREATE: &str = "user.create";
    pub const USER_ONE: &str = "user.one";
    pub const USER_CHANGE_PASSWORD: &str = "user.change_password";
    pub const DATA_SUBMIT: &str = "data.submit";
    pub const DATA_SEARCH: &str = "data.search";
    pub const RULE_LIST: &str = "rule.list";
    pub const RULE_ONE: &str = "rule.one";
    pub const RULE_DRAFT: &str = "rule.draft";
    pub const RULE_DRAFT_ONE: &str = "rule.draft_one";
    pub const ALERT_LIST: &str = "alert.list";
    pub const ALERT_ONE: &str = "alert.one";
    pub const ALERT_RESET: &str = "alert.reset";
    pub const ALERT_STATUS: &str = "alert.status";
}

/// SDK configuration
///
/// Loaded once at startup: target host, port, scheme, and the table mapping
/// each logical endpoint name to a URL template path. Templates carry
/// `{placeholder}` slugs that the URL resolver substitutes per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
    pub host: String,
    pub port: u16,
    /// `true` for https, `false` for http
    #[serde(default = "default_secure")]
    pub secure: bool,
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

fn default_secure() -> bool {
    true
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 443,
            secure: true,
            endpoints: default_endpoints(),
        }
    }
}

impl SdkConfig {
    /// Create a configuration for the given host and port
    ///
    /// The endpoint table starts from the built-in defaults.
    pub fn new(host: impl Into<String>, port: u16, secure: bool) -> Self {
        Self {
            host: host.into(),
            port,
            secure,
            endpoints: default_endpoints(),
        }
    }

    /// Load configuration from a JSON file
    ///
    /// Endpoint templates present in the file override the built-in
    /// defaults; names the file omits keep their default templates.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SdkError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SdkError::Config(format!(
                "cannot read config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;
        let mut config: SdkConfig = serde_json::from_str(&raw)
            .map_err(|e| SdkError::Config(format!("config file is not valid JSON: {}", e)))?;

        let mut endpoints = default_endpoints();
        endpoints.extend(config.endpoints);
        config.endpoints = endpoints;

        tracing::debug!(
            "Loaded SDK config: host={}, port={}, secure={}",
            config.host,
            config.port,
            config.secure
        );
        Ok(config)
    }

    /// Scheme + host + port prefix for every resolved URL
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Look up the URL template for a logical endpoint name
    pub fn template(&self, name: &str) -> Result<&str, SdkError> {
        self.endpoints
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| SdkError::Config(format!("no URL template for endpoint '{}'", name)))
    }
}

fn default_endpoints() -> HashMap<String, String> {
    let table = [
        (endpoint::AUTH_TOKEN, "/v1/api/auth/token"),
        (endpoint::AUTH_TOKEN_INFO, "/v1/api/auth/tokenInfo"),
        (endpoint::ACCOUNT_CREATE, "/v1/api/accounts"),
        (endpoint::ACCOUNT_ONE, "/v1/api/accounts/{accountId}"),
        (
            endpoint::ACCOUNT_ACTIVATION_CODE,
            "/v1/api/accounts/{accountId}/activationcode",
        ),
        (
            endpoint::ACCOUNT_ACTIVATION_CODE_REFRESH,
            "/v1/api/accounts/{accountId}/activationcode/refresh",
        ),
        (
            endpoint::DEVICE_LIST,
            "/v1/api/accounts/{accountId}/devices",
        ),
        (
            endpoint::DEVICE_ONE,
            "/v1/api/accounts/{accountId}/devices/{deviceId}",
        ),
        (
            endpoint::DEVICE_ACTIVATION,
            "/v1/api/accounts/{accountId}/devices/{deviceId}/activation",
        ),
        (
            endpoint::DEVICE_COMPONENTS,
            "/v1/api/accounts/{accountId}/devices/{deviceId}/components",
        ),
        (
            endpoint::DEVICE_COMPONENT_ONE,
            "/v1/api/accounts/{accountId}/devices/{deviceId}/components/{cid}",
        ),
        (
            endpoint::COMPONENT_CATALOG,
            "/v1/api/accounts/{accountId}/cmpcatalog",
        ),
        (endpoint::USER_CREATE, "/v1/api/users"),
        (endpoint::USER_ONE, "/v1/api/users/{userId}"),
        (
            endpoint::USER_CHANGE_PASSWORD,
            "/v1/api/users/forgot_password",
        ),
        (endpoint::DATA_SUBMIT, "/v1/api/data/{deviceId}"),
        (
            endpoint::DATA_SEARCH,
            "/v1/api/accounts/{accountId}/data/search",
        ),
        (endpoint::RULE_LIST, "/v1/api/accounts/{accountId}/rules"),
        (
            endpoint::RULE_ONE,
            "/v1/api/accounts/{accountId}/rules/{ruleId}",
        ),
        (
            endpoint::RULE_DRAFT,
            "/v1/api/accounts/{accountId}/rules/draft",
        ),
        (
            endpoint::RULE_DRAFT_ONE,
            "/v1/api/accounts/{accountId}/rules/draft/{ruleId}",
        ),
        (endpoint::ALERT_LIST, "/v1/api/accounts/{accountId}/alerts"),
        (
            endpoint::ALERT_ONE,
            "/v1/api/accounts/{accountId}/alerts/{alertId}",
        ),
        (
            endpoint::ALERT_RESET,
            "/v1/api/accounts/{accountId}/alerts/{alertId}/reset",
        ),
        (
            endpoint::ALERT_STATUS,
            "/v1/api/accounts/{accountId}/alerts/{alertId}/status/{statusName}",
        ),
    ];

    table
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
