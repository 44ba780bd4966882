use crate::session::{SessionError, SessionStore, KEY_ACCOUNT_ID, KEY_DEVICE_ID, KEY_USER_ID};
use std::collections::HashMap;
use std::fmt;

/// URL resolution errors
#[derive(Debug)]
pub enum ResolveError {
    /// A placeholder had neither an explicit parameter nor a session fallback
    MissingParameter(String),
    /// Session store could not be consulted for a fallback
    Session(SessionError),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::MissingParameter(name) => {
                write!(f, "no value for URL placeholder '{}'", name)
            }
            ResolveError::Session(e) => write!(f, "session lookup failed: {}", e),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<SessionError> for ResolveError {
    fn from(err: SessionError) -> Self {
        ResolveError::Session(err)
    }
}

/// Parameter name carrying the component *name* used to resolve `{cid}`
/// placeholders through the session component map.
pub const PARAM_COMPONENT_NAME: &str = "cname";

/// Resolves templated endpoint paths into concrete URLs
///
/// Each `{placeholder}` is substituted from the explicit parameters first,
/// then from a fixed session-store fallback:
///
/// - `{accountId}` → active account id
/// - `{deviceId}` → active device id
/// - `{userId}` → active user id
/// - `{cid}` / `{componentId}` → component map, keyed by the `cname` parameter
///
/// Resolution fails closed: if any placeholder stays unresolved the whole
/// call fails and no partial URL is ever handed to the dispatcher.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    base_url: String,
}

impl UrlResolver {
    /// Create a resolver that prefixes every path with `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// The configured scheme+host+port prefix
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Substitute every placeholder in `template` and prefix the base URL
    pub fn resolve(
        &self,
        template: &str,
        params: &HashMap<String, String>,
        session: &SessionStore,
    ) -> Result<String, ResolveError> {
        let mut resolved = String::with_capacity(self.base_url.len() + template.len());
        resolved.push_str(&self.base_url);

        let mut rest = template;
        while let Some(open) = rest.find('{') {
            let close = rest[open..].find('}').map(|i| open + i).ok_or_else(|| {
                // Unterminated slug, treat the malformed name as missing
                ResolveError::MissingParameter(rest[open + 1..].to_string())
            })?;

            resolved.push_str(&rest[..open]);
            let name = &rest[open + 1..close];
            let value = self.lookup(name, params, session)?;
            resolved.push_str(&value);
            rest = &rest[close + 1..];
        }
        resolved.push_str(rest);

        tracing::debug!("Resolved URL template {} -> {}", template, resolved);
        Ok(resolved)
    }

    fn lookup(
        &self,
        name: &str,
        params: &HashMap<String, String>,
        session: &SessionStore,
    ) -> Result<String, ResolveError> {
        // Explicit parameters always shadow session fallbacks
        if let Some(value) = params.get(name) {
            return Ok(value.clone());
        }

        let fallback = match name {
            "accountId" => session.get(KEY_ACCOUNT_ID)?,
            "deviceId" => session.get(KEY_DEVICE_ID)?,
            "userId" => session.get(KEY_USER_ID)?,
            "cid" | "componentId" => match params.get(PARAM_COMPONENT_NAME) {
                Some(cname) => session.component_id(cname)?,
                None => None,
            },
            _ => None,
        };

        fallback.ok_or_else(|| ResolveError::MissingParameter(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::KEY_ACCOUNT_ID;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn plain_template_gets_base_prefix() {
        let resolver = UrlResolver::new("https://iot.example.com:443");
        let session = SessionStore::in_memory();

        let url = resolver
            .resolve("/v1/api/auth/token", &HashMap::new(), &session)
            .unwrap();
        assert_eq!(url, "https://iot.example.com:443/v1/api/auth/token");
    }

    #[tokio::test]
    async fn explicit_param_shadows_session_value() {
        let resolver = UrlResolver::new("https://h:1");
        let session = SessionStore::in_memory();
        session.set(KEY_ACCOUNT_ID, "from-session").await.unwrap();

        let url = resolver
            .resolve(
                "/v1/api/accounts/{accountId}",
                &params(&[("accountId", "explicit")]),
                &session,
            )
            .unwrap();
        assert_eq!(url, "https://h:1/v1/api/accounts/explicit");
    }

    #[tokio::test]
    async fn session_fallback_fills_placeholder() {
        let resolver = UrlResolver::new("https://h:1");
        let session = SessionStore::in_memory();
        session.set(KEY_ACCOUNT_ID, "acc-77").await.unwrap();

        let url = resolver
            .resolve("/v1/api/accounts/{accountId}", &HashMap::new(), &session)
            .unwrap();
        assert_eq!(url, "https://h:1/v1/api/accounts/acc-77");
    }

    #[test]
    fn missing_placeholder_fails_closed() {
        let resolver = UrlResolver::new("https://h:1");
        let session = SessionStore::in_memory();

        let err = resolver
            .resolve("/v1/api/accounts/{accountId}", &HashMap::new(), &session)
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingParameter(name) if name == "accountId"));
    }

    #[tokio::test]
    async fn partially_resolvable_template_still_fails() {
        let resolver = UrlResolver::new("https://h:1");
        let session = SessionStore::in_memory();
        session.set(KEY_ACCOUNT_ID, "acc-77").await.unwrap();

        // accountId resolves, deviceId does not
        let err = resolver
            .resolve(
                "/v1/api/accounts/{accountId}/devices/{deviceId}",
                &HashMap::new(),
                &session,
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingParameter(name) if name == "deviceId"));
    }

    #[tokio::test]
    async fn cid_resolves_through_component_map() {
        let resolver = UrlResolver::new("https://h:1");
        let session = SessionStore::in_memory();
        session.set(KEY_ACCOUNT_ID, "a").await.unwrap();
        session.set("device_id", "d").await.unwrap();
        session.set_component_id("temp", "abc-123").await.unwrap();

        let url = resolver
            .resolve(
                "/v1/api/accounts/{accountId}/devices/{deviceId}/components/{cid}",
                &params(&[(PARAM_COMPONENT_NAME, "temp")]),
                &session,
            )
            .unwrap();
        assert!(url.ends_with("/components/abc-123"));

        session.remove_component("temp").await.unwrap();
        let err = resolver
            .resolve(
                "/v1/api/accounts/{accountId}/devices/{deviceId}/components/{cid}",
                &params(&[(PARAM_COMPONENT_NAME, "temp")]),
                &session,
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingParameter(name) if name == "cid"));
    }

    #[test]
    fn detached_session_surfaces_session_error() {
        let resolver = UrlResolver::new("https://h:1");
        let session = SessionStore::new();

        let err = resolver
            .resolve("/v1/api/accounts/{accountId}", &HashMap::new(), &session)
            .unwrap_err();
        assert!(matches!(err, ResolveError::Session(_)));
    }
}
