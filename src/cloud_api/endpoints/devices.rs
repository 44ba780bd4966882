use crate::cloud_api::config::endpoint;
use crate::cloud_api::endpoints::{no_params, params};
use crate::cloud_api::handler::{ApiResult, ResponseHandler, SessionUpdate};
use crate::cloud_api::types::{ApiError, DeviceActivation, SdkError};
use crate::cloud_api::url::PARAM_COMPONENT_NAME;
use crate::cloud_api::{Auth, CloudContext};
use crate::session::{KEY_DEVICE_ID, KEY_DEVICE_TOKEN};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

/// Device and component management endpoints
///
/// Component registration and deletion maintain the session's
/// component-name → component-id map, which the URL resolver uses for
/// `{cid}` slugs on later calls.
pub struct Devices {
    ctx: Arc<CloudContext>,
    handler: Option<Arc<dyn ResponseHandler>>,
}

impl Devices {
    pub fn new(ctx: Arc<CloudContext>, handler: Option<Arc<dyn ResponseHandler>>) -> Self {
        Self { ctx, handler }
    }

    /// Register a device under the active account. Expected success code: 201.
    ///
    /// On 201 the device id becomes the session's active device.
    pub async fn create_device(&self, device_id: &str, gateway_id: &str, name: &str) -> ApiResult {
        if device_id.is_empty() || gateway_id.is_empty() || name.is_empty() {
            return ApiResult::Rejected(
                "device id, gateway id, and name are required".to_string(),
            );
        }

        let body = json!({ "deviceId": device_id, "gatewayId": gateway_id, "name": name });
        let request = match self.ctx.build_request(
            endpoint::DEVICE_LIST,
            &no_params(),
            Method::POST,
            Auth::Bearer,
            Some(body),
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        let session = self.ctx.session().clone();
        let device_id = device_id.to_string();
        let pre: SessionUpdate = Box::new(move |status, _body| {
            Box::pin(async move {
                if status == Some(201) {
                    session.set(KEY_DEVICE_ID, device_id.clone()).await?;
                    tracing::info!("Tracking device {} as active", device_id);
                }
                Ok(())
            })
        });

        self.ctx.dispatch(request, Some(pre), self.handler.clone()).await
    }

    /// Activate the active device with an account activation code.
    /// Expected success code: 200.
    ///
    /// On 200 the returned device token is stored in the session; it
    /// authenticates device-originated observation submission.
    pub async fn activate_device(&self, activation_code: &str) -> ApiResult {
        if activation_code.is_empty() {
            return ApiResult::Rejected("activation code is required".to_string());
        }

        let request = match self.ctx.build_request(
            endpoint::DEVICE_ACTIVATION,
            &no_params(),
            Method::PUT,
            Auth::Bearer,
            Some(json!({ "activationCode": activation_code })),
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
                let activation: DeviceActivation = serde_json::from_str(&body).map_err(|e| {
                    SdkError::Api(ApiError::Parse(format!(
                        "activation response is not valid JSON: {}",
                        e
                    )))
                })?;
                session
                    .set(KEY_DEVICE_TOKEN, activation.device_token)
                    .await?;
                tracing::info!("Stored device token in session");
                Ok(())
            })
        });

        self.ctx.dispatch(request, Some(pre), self.handler.clone()).await
    }

    /// List devices under the active account. Expected success code: 200.
    pub async fn list_devices(&self) -> ApiResult {
        let request = match self.ctx.build_request(
            endpoint::DEVICE_LIST,
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

    /// Delete a device. Expected success code: 204.
    ///
    /// `device_id` defaults to the session's active device. On 204, if the
    /// deleted device was the active one, its id and token are dropped from
    /// the session.
    pub async fn delete_device(&self, device_id: Option<&str>) -> ApiResult {
        let explicit = match device_id {
            Some(id) => params([("deviceId", id)]),
            None => no_params(),
        };
        let request = match self.ctx.build_request(
            endpoint::DEVICE_ONE,
            &explicit,
            Method::DELETE,
            Auth::Bearer,
            None,
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        let session = self.ctx.session().clone();
        let deleted_id = device_id.map(str::to_string);
        let pre: SessionUpdate = Box::new(move |status, _body| {
            Box::pin(async move {
                if status != Some(204) {
                    return Ok(());
                }
                let active = session.get(KEY_DEVICE_ID)?;
                let deleted_active = match (&deleted_id, &active) {
                    (Some(deleted), Some(active)) => deleted == active,
                    // No explicit id means the active device was targeted
                    (None, Some(_)) => true,
                    _ => false,
                };
                if deleted_active {
                    session.remove(KEY_DEVICE_ID).await?;
                    session.remove(KEY_DEVICE_TOKEN).await?;
                    tracing::info!("Active device deleted, dropped id and token from session");
                }
                Ok(())
            })
        });

        self.ctx.dispatch(request, Some(pre), self.handler.clone()).await
    }

    /// Register a component on the active device. Expected success code: 201.
    ///
    /// Device-token call. On 201 the server-issued component id is recorded
    /// in the session component map under `name`.
    pub async fn add_component(&self, name: &str, component_type: &str) -> ApiResult {
        if name.is_empty() || component_type.is_empty() {
            return ApiResult::Rejected("component name and type are required".to_string());
        }

        let body = json!({ "name": name, "type": component_type });
        let request = match self.ctx.build_request(
            endpoint::DEVICE_COMPONENTS,
            &no_params(),
            Method::POST,
            Auth::DeviceToken,
            Some(body),
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        let session = self.ctx.session().clone();
        let name = name.to_string();
        let pre: SessionUpdate = Box::new(move |status, body| {
            Box::pin(async move {
                if status != Some(201) {
                    return Ok(());
                }
                let parsed: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
                    SdkError::Api(ApiError::Parse(format!(
                        "component response is not valid JSON: {}",
                        e
                    )))
                })?;
                let cid = parsed
                    .get("cid")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        SdkError::Api(ApiError::Parse(
                            "component response is missing 'cid'".to_string(),
                        ))
                    })?;
                session.set_component_id(name.clone(), cid).await?;
                tracing::info!("Registered component {} -> {}", name, cid);
                Ok(())
            })
        });

        self.ctx.dispatch(request, Some(pre), self.handler.clone()).await
    }

    /// Delete a component by its registered name. Expected success code: 204.
    ///
    /// Device-token call. The `{cid}` slug resolves through the session
    /// component map; on 204 the mapping is removed.
    pub async fn delete_component(&self, name: &str) -> ApiResult {
        if name.is_empty() {
            return ApiResult::Rejected("component name is required".to_string());
        }

        let request = match self.ctx.build_request(
            endpoint::DEVICE_COMPONENT_ONE,
            &params([(PARAM_COMPONENT_NAME, name)]),
            Method::DELETE,
            Auth::DeviceToken,
            None,
        ) {
            Ok(request) => request,
            Err(reason) => return ApiResult::Rejected(reason),
        };

        let session = self.ctx.session().clone();
        let name = name.to_string();
        let pre: SessionUpdate = Box::new(move |status, _body| {
            Box::pin(async move {
                if status == Some(204) {
                    session.remove_component(&name).await?;
                    tracing::info!("Removed component mapping for {}", name);
                }
                Ok(())
            })
        });

        self.ctx.dispatch(request, Some(pre), self.handler.clone()).await
    }

    /// List the account's component-type catalog. Expected success code: 200.
    pub async fn component_catalog(&self) -> ApiResult {
        let request = match self.ctx.build_request(
            endpoint::COMPONENT_CATALOG,
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
}
