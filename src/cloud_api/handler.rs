use crate::cloud_api::types::SdkError;
use std::future::Future;
use std::pin::Pin;

/// Outcome of invoking an endpoint
///
/// `Accepted` only means the request was handed to a worker (asynchronous
/// mode); it does not mean the server responded. `Completed` carries the
/// final transport outcome; a `status` of `None` marks a transport-level
/// failure with the error message in `body`. `Rejected` is a local
/// validation failure produced before any network activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResult {
    Accepted,
    Completed { status: Option<u16>, body: String },
    Rejected(String),
}

impl ApiResult {
    /// HTTP status of a completed call, when the transport produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiResult::Completed { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ApiResult::Rejected(_))
    }
}

/// Callback-style response handler
///
/// Supplied by the caller at module construction. Invoked exactly once per
/// dispatched request, on success or failure alike. `status` is `None` when
/// the transport failed before producing an HTTP status; `body` then carries
/// the error message instead of a response payload.
pub trait ResponseHandler: Send + Sync {
    fn on_result(&self, status: Option<u16>, body: &str);
}

impl<F> ResponseHandler for F
where
    F: Fn(Option<u16>, &str) + Send + Sync,
{
    fn on_result(&self, status: Option<u16>, body: &str) {
        self(status, body)
    }
}

/// Session-updating continuation run by the dispatcher before the caller's
/// handler observes the result
///
/// Endpoint modules use this to parse tokens and ids out of a successful
/// response and write them to the session store. The dispatcher awaits it to
/// completion first, so the caller's handler never sees session state that
/// does not yet reflect this call. Errors are logged and do not fail the
/// overall call; the caller still receives the raw transport outcome.
pub type SessionUpdate = Box<
    dyn FnOnce(Option<u16>, String) -> Pin<Box<dyn Future<Output = Result<(), SdkError>> + Send>>
        + Send,
>;
