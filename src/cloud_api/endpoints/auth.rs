use crate::cloud_api::config::endpoint;
use crate::cloud_api::endpoints::no_params;
use crate::cloud_api::handler::{ApiResult, ResponseHandler, SessionUpdate};
use crate::cloud_api::token::TokenClaims;
use crate::cloud_api::types::{ApiError, SdkError, TokenInfoResponse};
use crate::cloud_api::{Auth, CloudContext};
use crate::session::{KEY_AUTH_TOKEN, KEY_AUTH_TOKEN_EXPIRY, KEY_USER_ID};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

/// Authorization endpoints: obtain, inspect, and discard the bearer token
pub struct Authorization {
    ctx: Arc<CloudContext>,
    handler: Option<Arc<dyn ResponseHandler>>,
}

impl Authorization {
    pub fn new(ctx: Arc<CloudContext>, handler: Option<Arc<dyn ResponseHandler>>) -> Self {
        Self { ctx, handler }
    }

    /// Exchange credentials for a bearer token. Expected success code: 200.
    ///
    /// On 200 the token is stored in the session before the caller's handler
    /// runs; when the token is JWT-shaped, its expiry and subject are stored
    /// as the auth-token expiry and the active user id.
    pub async fn obtain_auth_token(&self, username: &str, password: &str) -> ApiResult {
        if username.is_empty() || password.is_empty() {
            return ApiResult::Rejected("username and password are required".to_string());
        }

        let body = json!({ "username": username, "password": password });
        let request = match self.ctx.build_request(
            endpoint::AUTH_TOKEN,
            &no_params(),
            Method::POST,
            Auth::None,
            Some(body),
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        let session = self.ctx.session().clone();
        let pre: SessionUpdate = Box::new(move |status, body| {
            Box::pin(async move {
                if status != Some(200) {
                    return Ok(());
                }
                let parsed: crate::cloud_api::types::AuthTokenResponse =
                    serde_json::from_str(&body).map_err(|e| {
                        SdkError::Api(ApiError::Parse(format!(
                            "token response is not valid JSON: {}",
                            e
                        )))
                    })?;

                session.set(KEY_AUTH_TOKEN, parsed.token.clone()).await?;
                match TokenClaims::from_token(&parsed.token) {
                    Ok(claims) => {
                        if let Some(expiry) = claims.expiry_rfc3339() {
                            session.set(KEY_AUTH_TOKEN_EXPIRY, expiry).await?;
                        }
                        if let Some(sub) = claims.sub {
                            session.set(KEY_USER_ID, sub).await?;
                        }
                    }
                    Err(e) => {
                        tracing::debug!("Auth token is opaque, skipping claim bookkeeping: {}", e)
                    }
                }
                tracing::info!("Stored new auth token in session");
                Ok(())
            })
        });

        self.ctx.dispatch(request, Some(pre), self.handler.clone()).await
    }

    /// Retrieve details about the current token. Expected success code: 200.
    ///
    /// On 200 the reported expiry and subject are written to the session.
    pub async fn token_info(&self) -> ApiResult {
        let request = match self.ctx.build_request(
            endpoint::AUTH_TOKEN_INFO,
            &no_params(),
            Method::GET,
            Auth::Bearer,
            None,
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        let session = self.ctx.session().clone();
        let pre: SessionUpdate = Box::new(move |status, body| {
            Box::pin(async move {
                if status != Some(200) {
                    return Ok(());
                }
                let parsed: TokenInfoResponse = serde_json::from_str(&body).map_err(|e| {
                    SdkError::Api(ApiError::Parse(format!(
                        "token-info response is not valid JSON: {}",
                        e
                    )))
                })?;

                if let Some(expire) = parsed.expire {
                    session.set(KEY_AUTH_TOKEN_EXPIRY, expire).await?;
                }
                if let Some(sub) = parsed.payload.and_then(|p| p.sub) {
                    session.set(KEY_USER_ID, sub).await?;
                }
                Ok(())
            })
        });

        self.ctx.dispatch(request, Some(pre), self.handler.clone()).await
    }

    /// Probe whether the stored token is still accepted by the server.
    /// Expected success code: 200.
    pub async fn validate_auth_token(&self) -> ApiResult {
        let request = match self.ctx.build_request(
            endpoint::AUTH_TOKEN_INFO,
            &no_params(),
            Method::GET,
            Auth::Bearer,
            None,
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }

    /// Discard the stored bearer token and its expiry
    ///
    /// Purely local; the platform has no token-revocation endpoint.
    pub async fn sign_out(&self) -> Result<(), SdkError> {
        let session = self.ctx.session();
        session.remove(KEY_AUTH_TOKEN).await?;
        session.remove(KEY_AUTH_TOKEN_EXPIRY).await?;
        tracing::info!("Signed out, auth token removed from session");
        Ok(())
    }
}
