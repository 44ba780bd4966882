use crate::cloud_api::config::endpoint;
use crate::cloud_api::endpoints::{no_params, params};
use crate::cloud_api::handler::{ApiResult, ResponseHandler};
use crate::cloud_api::{Auth, CloudContext};
use reqwest::Method;
use std::sync::Arc;

/// Alert endpoints
pub struct Alerts {
    ctx: Arc<CloudContext>,
    handler: Option<Arc<dyn ResponseHandler>>,
}

impl Alerts {
    pub fn new(ctx: Arc<CloudContext>, handler: Option<Arc<dyn ResponseHandler>>) -> Self {
        Self { ctx, handler }
    }

    /// List alerts under the active account. Expected success code: 200.
    pub async fn list_alerts(&self) -> ApiResult {
        let request = match self.ctx.build_request(
            endpoint::ALERT_LIST,
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

    /// Retrieve one alert. Expected success code: 200.
    pub async fn get_alert(&self, alert_id: &str) -> ApiResult {
        if alert_id.is_empty() {
            return ApiResult::Rejected("alert id is required".to_string());
        }

        let request = match self.ctx.build_request(
            endpoint::ALERT_ONE,
            &params([("alertId", alert_id)]),
            Method::GET,
            Auth::Bearer,
            None,
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }

    /// Reset an alert back to its untriggered state. Expected success code: 200.
    pub async fn reset_alert(&self, alert_id: &str) -> ApiResult {
        if alert_id.is_empty() {
            return ApiResult::Rejected("alert id is required".to_string());
        }

        let request = match self.ctx.build_request(
            endpoint::ALERT_RESET,
            &params([("alertId", alert_id)]),
            Method::PUT,
            Auth::Bearer,
            None,
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }

    /// Move an alert to a named status. Expected success code: 200.
    pub async fn update_alert_status(&self, alert_id: &str, status: &str) -> ApiResult {
        if alert_id.is_empty() || status.is_empty() {
            return ApiResult::Rejected("alert id and status are required".to_string());
        }

        let request = match self.ctx.build_request(
            endpoint::ALERT_STATUS,
            &params([("alertId", alert_id), ("statusName", status)]),
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
