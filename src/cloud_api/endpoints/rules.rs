use crate::cloud_api::config::endpoint;
use crate::cloud_api::endpoints::{no_params, params};
use crate::cloud_api::handler::{ApiResult, ResponseHandler};
use crate::cloud_api::{Auth, CloudContext};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

/// Rule management endpoints
///
/// Rule documents are passed through as caller-built JSON; this layer does
/// not model the rule schema.
pub struct Rules {
    ctx: Arc<CloudContext>,
    handler: Option<Arc<dyn ResponseHandler>>,
}

impl Rules {
    pub fn new(ctx: Arc<CloudContext>, handler: Option<Arc<dyn ResponseHandler>>) -> Self {
        Self { ctx, handler }
    }

    /// Create a rule under the active account. Expected success code: 201.
    pub async fn create_rule(&self, rule: serde_json::Value) -> ApiResult {
        let request = match self.ctx.build_request(
            endpoint::RULE_LIST,
            &no_params(),
            Method::POST,
            Auth::Bearer,
            Some(rule),
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }

    /// Replace an existing rule. Expected success code: 201.
    pub async fn update_rule(&self, rule_id: &str, rule: serde_json::Value) -> ApiResult {
        if rule_id.is_empty() {
            return ApiResult::Rejected("rule id is required".to_string());
        }

        let request = match self.ctx.build_request(
            endpoint::RULE_ONE,
            &params([("ruleId", rule_id)]),
            Method::PUT,
            Auth::Bearer,
            Some(rule),
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }

    /// List rules under the active account. Expected success code: 200.
    pub async fn list_rules(&self) -> ApiResult {
        let request = match self.ctx.build_request(
            endpoint::RULE_LIST,
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

    /// Retrieve one rule. Expected success code: 200.
    pub async fn get_rule(&self, rule_id: &str) -> ApiResult {
        if rule_id.is_empty() {
            return ApiResult::Rejected("rule id is required".to_string());
        }

        let request = match self.ctx.build_request(
            endpoint::RULE_ONE,
            &params([("ruleId", rule_id)]),
            Method::GET,
            Auth::Bearer,
            None,
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }

    /// Save a named rule draft. Expected success code: 200.
    pub async fn create_draft(&self, name: &str) -> ApiResult {
        if name.is_empty() {
            return ApiResult::Rejected("draft name is required".to_string());
        }

        let request = match self.ctx.build_request(
            endpoint::RULE_DRAFT,
            &no_params(),
            Method::PUT,
            Auth::Bearer,
            Some(json!({ "name": name })),
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }

    /// Delete a rule draft. Expected success code: 204.
    pub async fn delete_draft(&self, rule_id: &str) -> ApiResult {
        if rule_id.is_empty() {
            return ApiResult::Rejected("rule id is required".to_string());
        }

        let request = match self.ctx.build_request(
            endpoint::RULE_DRAFT_ONE,
            &params([("ruleId", rule_id)]),
            Method::DELETE,
            Auth::Bearer,
            None,
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        self.ctx.dispatch(request, None, self.handler.clone()).await
    }
}
