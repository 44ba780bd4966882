use crate::cloud_api::handler::{ApiResult, ResponseHandler, SessionUpdate};
use crate::cloud_api::types::ApiError;
use reqwest::Method;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// One in-flight HTTP call: target URL, verb, headers, optional JSON body
///
/// Created per invocation and consumed by the transport.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

/// Raw transport outcome: whatever status and body the server produced
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP transport trait
///
/// Abstracts the wire so tests can substitute spy and stub transports for
/// the real client. Implementations provide no retries and no SDK-level
/// timeouts; whatever the underlying client does is what callers get.
pub trait HttpTransport: Send + Sync {
    fn execute(
        &self,
        request: PendingRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, ApiError>> + Send + '_>>;
}

/// Production transport backed by `reqwest`
#[derive(Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(
        &self,
        request: PendingRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, ApiError>> + Send + '_>> {
        Box::pin(async move {
            tracing::debug!("Sending {} request to: {}", request.method, request.url);

            let mut builder = self.client.request(request.method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(|e| {
                tracing::error!("Failed to send request to {}: {}", request.url, e);
                ApiError::from(e)
            })?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            tracing::debug!("Received response with status: {}", status);
            Ok(HttpResponse { status, body })
        })
    }
}

/// Execution mode, selected per module instance at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Await the transport in place; `invoke` returns the final outcome
    Synchronous,
    /// Hand the call to a runtime worker; `invoke` returns `Accepted`
    Asynchronous,
}

/// Shared entry point every endpoint module uses to execute one HTTP request
///
/// Owns the synchronous/asynchronous branching and the completion contract:
/// exactly one completion per dispatched request, the session-updating
/// pre-processing step always finishing before the caller's handler runs.
/// No ordering is guaranteed between concurrently invoked calls; callers
/// needing sequencing must wait for one completion before issuing the next.
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    mode: DispatchMode,
}

impl Dispatcher {
    /// Create a dispatcher over an explicit transport
    pub fn new(transport: Arc<dyn HttpTransport>, mode: DispatchMode) -> Self {
        Self { transport, mode }
    }

    /// Create a dispatcher over the production `reqwest` transport
    pub fn with_default_transport(mode: DispatchMode) -> Self {
        Self::new(Arc::new(ReqwestTransport::new()), mode)
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Execute one request
    ///
    /// Rejects an empty URL locally, without any network activity. In
    /// synchronous mode the returned value is the final `Completed` outcome;
    /// in asynchronous mode it is `Accepted` and the outcome reaches the
    /// handler later. Transport failures surface as a completion with an
    /// absent status and the error message as body, never as a silent drop.
    pub async fn invoke(
        &self,
        request: PendingRequest,
        pre: Option<SessionUpdate>,
        handler: Option<Arc<dyn ResponseHandler>>,
    ) -> ApiResult {
        if request.url.is_empty() {
            tracing::warn!("Rejected request with empty URL");
            return ApiResult::Rejected("request URL is empty".to_string());
        }

        match self.mode {
            DispatchMode::Synchronous => {
                let (status, body) = Self::run(self.transport.as_ref(), request).await;
                Self::complete(pre, handler, status, &body).await;
                ApiResult::Completed { status, body }
            }
            DispatchMode::Asynchronous => {
                let transport = self.transport.clone();
                tokio::spawn(async move {
                    let (status, body) = Self::run(transport.as_ref(), request).await;
                    Self::complete(pre, handler, status, &body).await;
                });
                ApiResult::Accepted
            }
        }
    }

    async fn run(transport: &dyn HttpTransport, request: PendingRequest) -> (Option<u16>, String) {
        match transport.execute(request).await {
            Ok(response) => (Some(response.status), response.body),
            Err(e) => (None, e.to_string()),
        }
    }

    /// Run the pre-processing step, then the caller's handler, exactly once
    async fn complete(
        pre: Option<SessionUpdate>,
        handler: Option<Arc<dyn ResponseHandler>>,
        status: Option<u16>,
        body: &str,
    ) {
        if let Some(pre) = pre {
            if let Err(e) = pre(status, body.to_string()).await {
                tracing::warn!("Session pre-processing failed: {}", e);
            }
        }
        if let Some(handler) = handler {
            handler.on_result(status, body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport that records invocations and returns a canned response
    struct StubTransport {
        calls: AtomicUsize,
        response: Result<(u16, &'static str), &'static str>,
    }

    impl StubTransport {
        fn ok(status: u16, body: &'static str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Ok((status, body)),
            }
        }

        fn failing(message: &'static str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Err(message),
            }
        }
    }

    impl HttpTransport for StubTransport {
        fn execute(
            &self,
            _request: PendingRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, ApiError>> + Send + '_>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = self.response;
            Box::pin(async move {
                match response {
                    Ok((status, body)) => Ok(HttpResponse {
                        status,
                        body: body.to_string(),
                    }),
                    Err(message) => Err(ApiError::Network(message.to_string())),
                }
            })
        }
    }

    fn request(url: &str) -> PendingRequest {
        PendingRequest {
            url: url.to_string(),
            method: Method::GET,
            headers: vec![],
            body: None,
        }
    }

    #[tokio::test]
    async fn empty_url_is_rejected_without_network_activity() {
        let transport = Arc::new(StubTransport::ok(200, "{}"));
        let dispatcher = Dispatcher::new(transport.clone(), DispatchMode::Synchronous);

        let result = dispatcher.invoke(request(""), None, None).await;
        assert!(result.is_rejected());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn sync_invoke_returns_final_outcome() {
        let transport = Arc::new(StubTransport::ok(201, "created"));
        let dispatcher = Dispatcher::new(transport, DispatchMode::Synchronous);

        let result = dispatcher.invoke(request("http://h/x"), None, None).await;
        assert_eq!(
            result,
            ApiResult::Completed {
                status: Some(201),
                body: "created".to_string()
            }
        );
    }

    #[tokio::test]
    async fn transport_failure_completes_with_absent_status() {
        let transport = Arc::new(StubTransport::failing("connection refused"));
        let dispatcher = Dispatcher::new(transport, DispatchMode::Synchronous);

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_seen = calls.clone();
        let handler: Arc<dyn ResponseHandler> = Arc::new(move |status: Option<u16>, body: &str| {
            assert_eq!(status, None);
            assert!(body.contains("connection refused"));
            calls_seen.fetch_add(1, Ordering::SeqCst);
        });

        let result = dispatcher
            .invoke(request("http://h/x"), None, Some(handler))
            .await;

        assert_eq!(result.status(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn pre_processing_runs_before_handler() {
        let transport = Arc::new(StubTransport::ok(200, "body"));
        let dispatcher = Dispatcher::new(transport, DispatchMode::Synchronous);

        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let order_pre = order.clone();
        let pre: SessionUpdate = Box::new(move |_status, _body| {
            Box::pin(async move {
                order_pre.lock().unwrap().push("pre");
                Ok(())
            })
        });

        let order_handler = order.clone();
        let handler: Arc<dyn ResponseHandler> = Arc::new(move |_: Option<u16>, _: &str| {
            order_handler.lock().unwrap().push("handler");
        });

        dispatcher
            .invoke(request("http://h/x"), Some(pre), Some(handler))
            .await;

        assert_eq!(*order.lock().unwrap(), vec!["pre", "handler"]);
    }

    #[tokio::test]
    async fn pre_processing_error_does_not_fail_the_call() {
        let transport = Arc::new(StubTransport::ok(200, "not json at all"));
        let dispatcher = Dispatcher::new(transport, DispatchMode::Synchronous);

        let pre: SessionUpdate = Box::new(|_status, _body| {
            Box::pin(async move {
                Err(crate::cloud_api::types::SdkError::Config(
                    "parse failed".to_string(),
                ))
            })
        });

        let result = dispatcher
            .invoke(request("http://h/x"), Some(pre), None)
            .await;
        assert_eq!(result.status(), Some(200));
    }

    #[tokio::test]
    async fn async_invoke_returns_accepted_and_completes_later() {
        let transport = Arc::new(StubTransport::ok(200, "ok"));
        let dispatcher = Dispatcher::new(transport, DispatchMode::Asynchronous);

        let (tx, rx) = tokio::sync::oneshot::channel::<Option<u16>>();
        let tx = std::sync::Mutex::new(Some(tx));
        let handler: Arc<dyn ResponseHandler> = Arc::new(move |status: Option<u16>, _: &str| {
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send(status);
            }
        });

        let result = dispatcher
            .invoke(request("http://h/x"), None, Some(handler))
            .await;
        assert_eq!(result, ApiResult::Accepted);

        let status = rx.await.unwrap();
        assert_eq!(status, Some(200));
    }
}
