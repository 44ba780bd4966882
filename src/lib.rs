//! Stratus SDK
//!
//! A Rust client library for the Stratus cloud IoT platform REST API.
//!
//! This SDK provides:
//! - Endpoint modules for authorization, account/device/user/rule/alert
//!   management, and observation submission/query
//! - A durable session store (auth token, device token, active ids, and the
//!   component-name → component-id map) backed by the OS keychain or the
//!   filesystem
//! - A URL resolver that fills template slugs from explicit parameters or
//!   session fallbacks
//! - A request dispatcher with synchronous and asynchronous execution modes
//!   and an exactly-once response handler contract
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stratus_sdk::{
//!     Authorization, CloudContext, Devices, DispatchMode, SdkConfig, SessionStore,
//!     storage::FilesystemStorage,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Attach durable storage so the session survives restarts
//! let session = Arc::new(SessionStore::new());
//! session
//!     .attach(Arc::new(FilesystemStorage::for_instance("my-app")?))
//!     .await?;
//!
//! let config = SdkConfig::new("iot.example.com", 443, true);
//! let ctx = Arc::new(CloudContext::new(config, session, DispatchMode::Synchronous));
//!
//! // Sign in; the token lands in the session before the call returns
//! let auth = Authorization::new(ctx.clone(), None);
//! let result = auth.obtain_auth_token("user@example.com", "secret").await;
//! println!("login status: {:?}", result.status());
//!
//! // Later calls resolve the active account and device from the session
//! let devices = Devices::new(ctx, None);
//! devices.create_device("dev-1", "gw-1", "Greenhouse sensor").await;
//! # Ok(())
//! # }
//! ```

pub mod cloud_api;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use cloud_api::{
    endpoints::{Accounts, Alerts, Authorization, Devices, Observations, Rules, Users},
    ApiError, ApiResult, CloudContext, DispatchMode, Dispatcher, HttpResponse, HttpTransport,
    PendingRequest, ResolveError, ResponseHandler, SdkConfig, SdkError, TokenClaims, UrlResolver,
};
pub use session::{SessionError, SessionStore};
pub use storage::{FilesystemStorage, KeyringStorage, MemoryStorage, StorageBackend, StorageError};
