use crate::cloud_api::config::endpoint;
use crate::cloud_api::endpoints::no_params;
use crate::cloud_api::handler::{ApiResult, ResponseHandler};
use crate::cloud_api::{Auth, CloudContext};
use crate::session::KEY_ACCOUNT_ID;
use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

/// Observation submission and query endpoints
pub struct Observations {
    ctx: Arc<CloudContext>,
    handler: Option<Arc<dyn ResponseHandler>>,
}

impl Observations {
    pub fn new(ctx: Arc<CloudContext>, handler: Option<Arc<dyn ResponseHandler>>) -> Self {
        Self { ctx, handler }
    }

    /// Submit one observation for a registered component.
    /// Expected success code: 201.
    ///
    /// Device-token call. The component id comes from the session component
    /// map; an unregistered `component_name` is a local rejection, no
    /// network activity. `location` is an optional (latitude, longitude)
    /// pair.
    pub async fn submit(
        &self,
        component_name: &str,
        value: &str,
        location: Option<(f64, f64)>,
    ) -> ApiResult {
        if component_name.is_empty() || value.is_empty() {
            return ApiResult::Rejected("component name and value are required".to_string());
        }

        let cid = match self.ctx.session().component_id(component_name) {
            Ok(Some(cid)) => cid,
            Ok(None) => {
                return ApiResult::Rejected(format!(
                    "no component registered under name '{}'",
                    component_name
                ))
            }
            Err(e) => return ApiResult::Rejected(e.to_string()),
        };
        let account_id = match self.ctx.session().get(KEY_ACCOUNT_ID) {
            Ok(Some(id)) => id,
            Ok(None) => return ApiResult::Rejected("no account id in session".to_string()),
            Err(e) => return ApiResult::Rejected(e.to_string()),
        };

        let now = Utc::now().timestamp_millis();
        let mut point = json!({ "componentId": cid, "on": now, "value": value });
        if let Some((latitude, longitude)) = location {
            point["loc"] = json!([latitude, longitude]);
        }
        let body = json!({ "on": now, "accountId": account_id, "data": [point] });

        let request = match self.ctx.build_request(
            endpoint::DATA_SUBMIT,
            &no_params(),
            Method::POST,
            Auth::DeviceToken,
            Some(body),
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }

    /// Search observations under the active account.
    /// Expected success code: 200.
    ///
    /// `criteria` is the platform's search document (time range, device and
    /// component filters); this layer passes it through unmodified.
    pub async fn search(&self, criteria: serde_json::Value) -> ApiResult {
        let request = match self.ctx.build_request(
            endpoint::DATA_SEARCH,
            &no_params(),
            Method::POST,
            Auth::Bearer,
            Some(criteria),
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }
}
