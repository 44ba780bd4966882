use crate::cloud_api::config::endpoint;
use crate::cloud_api::endpoints::no_params;
use crate::cloud_api::handler::{ApiResult, ResponseHandler, SessionUpdate};
use crate::cloud_api::types::{AccountInfo, ApiError, SdkError};
use crate::cloud_api::{Auth, CloudContext};
use crate::session::{KEY_ACCOUNT_ID, KEY_ACCOUNT_NAME};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

/// Account management endpoints
///
/// The session tracks exactly one active account at a time; creating an
/// account replaces the tracked id and name.
pub struct Accounts {
    ctx: Arc<CloudContext>,
    handler: Option<Arc<dyn ResponseHandler>>,
}

impl Accounts {
    pub fn new(ctx: Arc<CloudContext>, handler: Option<Arc<dyn ResponseHandler>>) -> Self {
        Self { ctx, handler }
    }

    /// Create an account. Expected success code: 201.
    ///
    /// On 201 the returned account id and name become the session's active
    /// account before the caller's handler runs.
    pub async fn create_account(&self, name: &str) -> ApiResult {
        if name.is_empty() {
            return ApiResult::Rejected("account name is required".to_string());
        }

        let request = match self.ctx.build_request(
            endpoint::ACCOUNT_CREATE,
            &no_params(),
            Method::POST,
            Auth::Bearer,
            Some(json!({ "name": name })),
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        let session = self.ctx.session().clone();
        let pre: SessionUpdate = Box::new(move |status, body| {
            Box::pin(async move {
                if status != Some(201) {
                    return Ok(());
                }
                let account: AccountInfo = serde_json::from_str(&body).map_err(|e| {
                    SdkError::Api(ApiError::Parse(format!(
                        "account response is not valid JSON: {}",
                        e
                    )))
                })?;
                session.set(KEY_ACCOUNT_ID, account.id.clone()).await?;
                session.set(KEY_ACCOUNT_NAME, account.name).await?;
                tracing::info!("Tracking account {} as active", account.id);
                Ok(())
            })
        });

        self.ctx.dispatch(request, Some(pre), self.handler.clone()).await
    }

    /// Retrieve the active account. Expected success code: 200.
    pub async fn get_account_info(&self) -> ApiResult {
        let request = match self.ctx.build_request(
            endpoint::ACCOUNT_ONE,
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

    /// Update attributes of the active account. Expected success code: 200.
    ///
    /// `attributes` is the full attribute object the platform expects; this
    /// layer does not model its schema.
    pub async fn update_account(&self, attributes: serde_json::Value) -> ApiResult {
        let request = match self.ctx.build_request(
            endpoint::ACCOUNT_ONE,
            &no_params(),
            Method::PUT,
            Auth::Bearer,
            Some(attributes),
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }

    /// Delete the active account. Expected success code: 204.
    ///
    /// On 204 the entire session is cleared before the caller's handler
    /// runs: the account is gone, so every stored identifier is stale.
    pub async fn delete_account(&self) -> ApiResult {
        let request = match self.ctx.build_request(
            endpoint::ACCOUNT_ONE,
            &no_params(),
            Method::DELETE,
            Auth::Bearer,
            None,
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        let session = self.ctx.session().clone();
        let pre: SessionUpdate = Box::new(move |status, _body| {
            Box::pin(async move {
                if status == Some(204) {
                    session.clear().await?;
                }
                Ok(())
            })
        });

        self.ctx.dispatch(request, Some(pre), self.handler.clone()).await
    }

    /// Read the current device-activation code. Expected success code: 200.
    pub async fn get_activation_code(&self) -> ApiResult {
        let request = match self.ctx.build_request(
            endpoint::ACCOUNT_ACTIVATION_CODE,
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

    /// Issue a fresh device-activation code. Expected success code: 200.
    pub async fn refresh_activation_code(&self) -> ApiResult {
        let request = match self.ctx.build_request(
            endpoint::ACCOUNT_ACTIVATION_CODE_REFRESH,
            &no_params(),
            Method::PUT,
            Auth::Bearer,
            None,
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }
}
