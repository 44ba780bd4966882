use crate::cloud_api::config::endpoint;
use crate::cloud_api::endpoints::{no_params, params};
use crate::cloud_api::handler::{ApiResult, ResponseHandler, SessionUpdate};
use crate::cloud_api::types::{ApiError, SdkError};
use crate::cloud_api::{Auth, CloudContext};
use crate::session::KEY_USER_ID;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

/// User management endpoints
pub struct Users {
    ctx: Arc<CloudContext>,
    handler: Option<Arc<dyn ResponseHandler>>,
}

impl Users {
    pub fn new(ctx: Arc<CloudContext>, handler: Option<Arc<dyn ResponseHandler>>) -> Self {
        Self { ctx, handler }
    }

    /// Sign up a user. Expected success code: 201.
    ///
    /// Unauthenticated call. On 201 the returned user id becomes the
    /// session's active user.
    pub async fn create_user(&self, email: &str, password: &str) -> ApiResult {
        if email.is_empty() || password.is_empty() {
            return ApiResult::Rejected("email and password are required".to_string());
        }

        let body = json!({ "email": email, "password": password });
        let request = match self.ctx.build_request(
            endpoint::USER_CREATE,
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
                if status != Some(201) {
                    return Ok(());
                }
                let parsed: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
                    SdkError::Api(ApiError::Parse(format!(
                        "user response is not valid JSON: {}",
                        e
                    )))
                })?;
                if let Some(id) = parsed.get("id").and_then(|v| v.as_str()) {
                    session.set(KEY_USER_ID, id).await?;
                    tracing::info!("Tracking user {} as active", id);
                }
                Ok(())
            })
        });

        self.ctx.dispatch(request, Some(pre), self.handler.clone()).await
    }

    /// Retrieve a user. Expected success code: 200.
    ///
    /// `user_id` defaults to the session's active user.
    pub async fn get_user_info(&self, user_id: Option<&str>) -> ApiResult {
        let explicit = match user_id {
            Some(id) => params([("userId", id)]),
            None => no_params(),
        };
        let request = match self.ctx.build_request(
            endpoint::USER_ONE,
            &explicit,
            Method::GET,
            Auth::Bearer,
            None,
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }

    /// Update attributes of the active user. Expected success code: 200.
    pub async fn update_user_attributes(&self, attributes: serde_json::Value) -> ApiResult {
        let request = match self.ctx.build_request(
            endpoint::USER_ONE,
            &no_params(),
            Method::PUT,
            Auth::Bearer,
            Some(json!({ "attributes": attributes })),
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }

    /// Delete a user. Expected success code: 204.
    ///
    /// `user_id` defaults to the session's active user. On 204 the entire
    /// session is cleared; nothing stored remains meaningful.
    pub async fn delete_user(&self, user_id: Option<&str>) -> ApiResult {
        let explicit = match user_id {
            Some(id) => params([("userId", id)]),
            None => no_params(),
        };
        let request = match self.ctx.build_request(
            endpoint::USER_ONE,
            &explicit,
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

    /// Start a password reset for an email address. Expected success code: 200.
    pub async fn request_password_change(&self, email: &str) -> ApiResult {
        if email.is_empty() {
            return ApiResult::Rejected("email is required".to_string());
        }

        let request = match self.ctx.build_request(
            endpoint::USER_CHANGE_PASSWORD,
            &no_params(),
            Method::POST,
            Auth::None,
            Some(json!({ "email": email })),
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }

    /// Commit a password reset with the emailed token. Expected success code: 200.
    pub async fn commit_password_change(&self, token: &str, new_password: &str) -> ApiResult {
        if token.is_empty() || new_password.is_empty() {
            return ApiResult::Rejected("reset token and new password are required".to_string());
        }

        let request = match self.ctx.build_request(
            endpoint::USER_CHANGE_PASSWORD,
            &no_params(),
            Method::PUT,
            Auth::None,
            Some(json!({ "token": token, "password": new_password })),
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }
}
