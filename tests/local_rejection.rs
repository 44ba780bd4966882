//! Local rejection tests
//!
//! A call that cannot be assembled — unresolvable URL slug, missing
//! credential, unregistered component — must be rejected before any
//! network activity. A spy transport proves nothing went out.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stratus_sdk::session::{KEY_ACCOUNT_ID, KEY_AUTH_TOKEN, KEY_DEVICE_ID, KEY_DEVICE_TOKEN};
use stratus_sdk::{
    ApiError, CloudContext, Devices, DispatchMode, Dispatcher, HttpResponse, HttpTransport,
    Observations, PendingRequest, Rules, SdkConfig, SessionStore,
};

/// Transport that counts invocations and answers 200
#[derive(Default)]
struct SpyTransport {
    calls: AtomicUsize,
}

impl HttpTransport for SpyTransport {
    fn execute(
        &self,
        _request: PendingRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, ApiError>> + Send + '_>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {
            Ok(HttpResponse {
                status: 200,
                body: "{}".to_string(),
            })
        })
    }
}

fn context_with_spy(session: Arc<SessionStore>) -> (Arc<CloudContext>, Arc<SpyTransport>) {
    let spy = Arc::new(SpyTransport::default());
    let dispatcher = Dispatcher::new(spy.clone(), DispatchMode::Synchronous);
    let config = SdkConfig::new("iot.example.com", 443, true);
    let ctx = Arc::new(CloudContext::with_transport(config, session, dispatcher));
    (ctx, spy)
}

#[tokio::test]
async fn missing_account_id_rejects_without_network_activity() {
    let session = Arc::new(SessionStore::in_memory());
    session.set(KEY_AUTH_TOKEN, "tok").await.unwrap();

    let (ctx, spy) = context_with_spy(session);
    let devices = Devices::new(ctx, None);

    let result = devices.list_devices().await;
    assert!(result.is_rejected());
    assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_auth_token_rejects_without_network_activity() {
    let session = Arc::new(SessionStore::in_memory());
    session.set(KEY_ACCOUNT_ID, "a-1").await.unwrap();

    let (ctx, spy) = context_with_spy(session);
    let rules = Rules::new(ctx, None);

    let result = rules.list_rules().await;
    assert!(result.is_rejected());
    assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_device_token_rejects_component_registration() {
    let session = Arc::new(SessionStore::in_memory());
    session.set(KEY_AUTH_TOKEN, "tok").await.unwrap();
    session.set(KEY_ACCOUNT_ID, "a-1").await.unwrap();
    session.set(KEY_DEVICE_ID, "d-1").await.unwrap();

    let (ctx, spy) = context_with_spy(session);
    let devices = Devices::new(ctx, None);

    let result = devices.add_component("temp", "temperature.v1.0").await;
    assert!(result.is_rejected());
    assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unregistered_component_rejects_observation_submit() {
    let session = Arc::new(SessionStore::in_memory());
    session.set(KEY_ACCOUNT_ID, "a-1").await.unwrap();
    session.set(KEY_DEVICE_ID, "d-1").await.unwrap();
    session.set(KEY_DEVICE_TOKEN, "dtok").await.unwrap();

    let (ctx, spy) = context_with_spy(session);
    let observations = Observations::new(ctx, None);

    let result = observations.submit("nonexistent", "21.5", None).await;
    assert!(result.is_rejected());
    assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn detached_session_rejects_authenticated_calls() {
    let session = Arc::new(SessionStore::new());

    let (ctx, spy) = context_with_spy(session);
    let devices = Devices::new(ctx, None);

    let result = devices.list_devices().await;
    assert!(result.is_rejected());
    assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn explicit_parameters_shadow_session_state() {
    let session = Arc::new(SessionStore::in_memory());
    session.set(KEY_AUTH_TOKEN, "tok").await.unwrap();
    session.set(KEY_ACCOUNT_ID, "a-1").await.unwrap();
    session.set(KEY_DEVICE_ID, "d-session").await.unwrap();

    let (ctx, spy) = context_with_spy(session.clone());
    let devices = Devices::new(ctx, None);

    // Deleting a non-active device by explicit id completes against the spy
    // and must not disturb the session's active device
    let result = devices.delete_device(Some("d-other")).await;
    assert_eq!(result.status(), Some(200));
    assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        session.get(KEY_DEVICE_ID).unwrap(),
        Some("d-session".to_string())
    );
}
