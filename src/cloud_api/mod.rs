//! Stratus cloud API integration module
//!
//! Everything an endpoint module needs to execute one REST call lives here:
//! the configuration and URL-template table, the slug resolver, the request
//! dispatcher with its synchronous/asynchronous duality, and the response
//! handler contract.
//!
//! ## Call flow
//!
//! 1. An endpoint module validates its arguments and builds a JSON body
//! 2. The URL resolver substitutes template slugs, consulting the session
//!    store for implicit parameters (active account, device, component ids)
//! 3. The dispatcher executes the HTTP call in the configured mode
//! 4. The module's session-updating pre-processing step runs to completion
//! 5. The caller's response handler observes the final result

pub mod config;
pub mod dispatch;
pub mod endpoints;
pub mod handler;
pub mod token;
pub mod types;
pub mod url;

pub use config::SdkConfig;
pub use dispatch::{DispatchMode, Dispatcher, HttpResponse, HttpTransport, PendingRequest};
pub use handler::{ApiResult, ResponseHandler, SessionUpdate};
pub use token::TokenClaims;
pub use types::{ApiError, SdkError};
pub use url::{ResolveError, UrlResolver};

use crate::session::SessionStore;
use reqwest::Method;
use std::collections::HashMap;
use std::sync::Arc;

/// Credential attached to an outgoing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    /// No Authorization header (login, sign-up, password reset)
    None,
    /// `Authorization: Bearer <auth token>` from the session
    Bearer,
    /// `Authorization: Bearer <device token>` from the session
    DeviceToken,
}

/// Shared state behind every endpoint module
///
/// Construct one per SDK instance and hand an `Arc` of it to each endpoint
/// module. The dispatch mode is fixed at construction.
pub struct CloudContext {
    config: SdkConfig,
    resolver: UrlResolver,
    session: Arc<SessionStore>,
    dispatcher: Dispatcher,
}

impl CloudContext {
    /// Create a context over the production HTTP transport
    pub fn new(config: SdkConfig, session: Arc<SessionStore>, mode: DispatchMode) -> Self {
        Self::with_transport(
            config,
            session,
            Dispatcher::with_default_transport(mode),
        )
    }

    /// Create a context over an explicit dispatcher (custom transport)
    pub fn with_transport(
        config: SdkConfig,
        session: Arc<SessionStore>,
        dispatcher: Dispatcher,
    ) -> Self {
        let resolver = UrlResolver::new(config.base_url());
        tracing::debug!("Creating CloudContext with base URL: {}", resolver.base_url());
        Self {
            config,
            resolver,
            session,
            dispatcher,
        }
    }

    /// The session store this context reads fallbacks from and writes
    /// pre-processing results to
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Assemble one pending request for a logical endpoint
    ///
    /// Fails with a rejection reason (no network activity) when the endpoint
    /// template is unknown, a URL slug cannot be resolved, or the required
    /// credential is missing from the session.
    pub(crate) fn build_request(
        &self,
        endpoint_name: &str,
        params: &HashMap<String, String>,
        method: Method,
        auth: Auth,
        body: Option<serde_json::Value>,
    ) -> Result<PendingRequest, String> {
        let template = self
            .config
            .template(endpoint_name)
            .map_err(|e| e.to_string())?;
        let url = self
            .resolver
            .resolve(template, params, &self.session)
            .map_err(|e| e.to_string())?;

        let mut headers = vec![(
            "Content-Type".to_string(),
            "application/json".to_string(),
        )];
        match auth {
            Auth::None => {}
            Auth::Bearer => {
                let token = self
                    .session
                    .auth_token()
                    .map_err(|e| e.to_string())?
                    .ok_or_else(|| "no auth token in session; sign in first".to_string())?;
                headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
            }
            Auth::DeviceToken => {
                let token = self
                    .session
                    .device_token()
                    .map_err(|e| e.to_string())?
                    .ok_or_else(|| {
                        "no device token in session; activate a device first".to_string()
                    })?;
                headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
            }
        }

        Ok(PendingRequest {
            url,
            method,
            headers,
            body,
        })
    }

    /// Execute one assembled request through the dispatcher
    pub(crate) async fn dispatch(
        &self,
        request: PendingRequest,
        pre: Option<SessionUpdate>,
        handler: Option<Arc<dyn ResponseHandler>>,
    ) -> ApiResult {
        self.dispatcher.invoke(request, pre, handler).await
    }
}
