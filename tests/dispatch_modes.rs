//! Dispatcher behavior tests
//!
//! Verify the synchronous/asynchronous duality and the exactly-once
//! completion contract against a mock HTTP server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use stratus_sdk::{
    ApiResult, DispatchMode, Dispatcher, PendingRequest, ResponseHandler,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn get_request(url: String) -> PendingRequest {
    PendingRequest {
        url,
        method: reqwest::Method::GET,
        headers: vec![],
        body: None,
    }
}

/// Handler that counts invocations and keeps the last outcome
struct CountingHandler {
    calls: AtomicUsize,
    last: Mutex<Option<(Option<u16>, String)>>,
}

impl CountingHandler {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }
}

impl ResponseHandler for CountingHandler {
    fn on_result(&self, status: Option<u16>, body: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((status, body.to_string()));
    }
}

#[tokio::test]
async fn synchronous_invoke_blocks_for_the_response() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("done")
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = Dispatcher::with_default_transport(DispatchMode::Synchronous);

    let started = Instant::now();
    let result = dispatcher
        .invoke(get_request(format!("{}/slow", mock_server.uri())), None, None)
        .await;
    let elapsed = started.elapsed();

    assert!(
        elapsed >= Duration::from_millis(300),
        "sync invoke returned before the delay elapsed: {:?}",
        elapsed
    );
    assert_eq!(result.status(), Some(200));
}

#[tokio::test]
async fn asynchronous_invoke_returns_accepted_immediately() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("done")
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = Dispatcher::with_default_transport(DispatchMode::Asynchronous);
    let handler = CountingHandler::new();

    let started = Instant::now();
    let result = dispatcher
        .invoke(
            get_request(format!("{}/slow", mock_server.uri())),
            None,
            Some(handler.clone() as Arc<dyn ResponseHandler>),
        )
        .await;
    let elapsed = started.elapsed();

    assert_eq!(result, ApiResult::Accepted);
    assert!(
        elapsed < Duration::from_millis(200),
        "async invoke did not return promptly: {:?}",
        elapsed
    );

    // The completion still arrives, exactly once
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    let last = handler.last.lock().unwrap().clone().unwrap();
    assert_eq!(last.0, Some(200));
}

#[tokio::test]
async fn sync_handler_fires_exactly_once_per_invoke() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dispatcher = Dispatcher::with_default_transport(DispatchMode::Synchronous);
    let handler = CountingHandler::new();

    for _ in 0..2 {
        dispatcher
            .invoke(
                get_request(format!("{}/ok", mock_server.uri())),
                None,
                Some(handler.clone() as Arc<dyn ResponseHandler>),
            )
            .await;
    }

    assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn transport_failure_reaches_the_handler_exactly_once() {
    // Nothing listens on this port; the connection is refused
    let dispatcher = Dispatcher::with_default_transport(DispatchMode::Synchronous);
    let handler = CountingHandler::new();

    let result = dispatcher
        .invoke(
            get_request("http://127.0.0.1:9/unreachable".to_string()),
            None,
            Some(handler.clone() as Arc<dyn ResponseHandler>),
        )
        .await;

    // Completed with an absent status, error message as body
    match &result {
        ApiResult::Completed { status, body } => {
            assert_eq!(*status, None);
            assert!(!body.is_empty());
        }
        other => panic!("expected Completed, got {:?}", other),
    }

    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    let last = handler.last.lock().unwrap().clone().unwrap();
    assert_eq!(last.0, None);
}

#[tokio::test]
async fn async_transport_failure_reaches_the_handler_exactly_once() {
    let dispatcher = Dispatcher::with_default_transport(DispatchMode::Asynchronous);
    let handler = CountingHandler::new();

    let result = dispatcher
        .invoke(
            get_request("http://127.0.0.1:9/unreachable".to_string()),
            None,
            Some(handler.clone() as Arc<dyn ResponseHandler>),
        )
        .await;
    assert_eq!(result, ApiResult::Accepted);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    let last = handler.last.lock().unwrap().clone().unwrap();
    assert_eq!(last.0, None);
}

#[tokio::test]
async fn empty_url_is_rejected_locally() {
    let dispatcher = Dispatcher::with_default_transport(DispatchMode::Synchronous);
    let handler = CountingHandler::new();

    let result = dispatcher
        .invoke(
            get_request(String::new()),
            None,
            Some(handler.clone() as Arc<dyn ResponseHandler>),
        )
        .await;

    assert!(result.is_rejected());
    // A rejection never produces a completion
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
}
