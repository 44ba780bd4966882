use crate::cloud_api::types::ApiError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Claims peeked out of a bearer token, without signature verification
///
/// The SDK holds no verification keys; the server is the authority on token
/// validity. The payload is decoded only to bookkeep the expiry and the
/// user id in the session store right after a login succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user id)
    pub sub: Option<String>,
    /// Expiry as a unix timestamp
    pub exp: Option<i64>,
    /// Issuer
    pub iss: Option<String>,
}

impl TokenClaims {
    /// Decode the payload segment of a JWT-shaped bearer token
    pub fn from_token(token: &str) -> Result<Self, ApiError> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next()) {
            (Some(_header), Some(payload)) => payload,
            _ => {
                return Err(ApiError::Parse(
                    "token is not in JWT format (missing payload segment)".to_string(),
                ))
            }
        };

        let raw = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| ApiError::Parse(format!("token payload is not valid base64: {}", e)))?;

        serde_json::from_slice(&raw)
            .map_err(|e| ApiError::Parse(format!("token payload is not valid JSON: {}", e)))
    }

    /// Expiry as a UTC timestamp, when the claim is present and in range
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    /// Expiry in RFC 3339 form, as stored in the session
    pub fn expiry_rfc3339(&self) -> Option<String> {
        self.expiry().map(|dt| dt.to_rfc3339())
    }

    /// Whether the expiry claim is in the past
    ///
    /// A token without an `exp` claim is treated as not expired; the server
    /// still gets the final say on every call.
    pub fn is_expired(&self) -> bool {
        match self.expiry() {
            Some(expiry) => expiry < Utc::now(),
            None => false,
        }
    }
}
