use crate::storage::{MemoryStorage, StorageBackend, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Path where the session document is stored relative to the storage root
pub const SESSION_DOCUMENT_PATH: &str = "stratus/session.json";

/// Session keys
///
/// The persisted layout is a flat string-keyed map; these constants are the
/// complete set of well-known keys. The component-name → component-id map is
/// carried alongside the flat keys in the same document.
pub const KEY_AUTH_TOKEN: &str = "auth_token";
pub const KEY_AUTH_TOKEN_EXPIRY: &str = "auth_token_expiry";
pub const KEY_ACCOUNT_ID: &str = "account_id";
pub const KEY_ACCOUNT_NAME: &str = "account_name";
pub const KEY_USER_ID: &str = "user_id";
pub const KEY_DEVICE_ID: &str = "device_id";
pub const KEY_DEVICE_TOKEN: &str = "device_token";

/// Session store errors
#[derive(Debug)]
pub enum SessionError {
    /// No storage backend has been attached; distinct from "key absent"
    NotAttached,
    /// Backing storage failed
    Storage(StorageError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotAttached => write!(f, "session store has no storage attached"),
            SessionError::Storage(e) => write!(f, "session storage error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        SessionError::Storage(err)
    }
}

/// Persisted shape of the session document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionSnapshot {
    #[serde(default)]
    values: HashMap<String, String>,
    #[serde(default)]
    components: HashMap<String, String>,
}

struct Attached {
    backend: Arc<dyn StorageBackend>,
    snapshot: SessionSnapshot,
}

/// Durable session state for one SDK instance
///
/// Holds the bearer token, the active account/user/device identifiers, the
/// device token, and the component-name → component-id map. Every mutation
/// is written through to the attached storage backend, so the session
/// survives process restarts. Reads are served from the in-memory snapshot.
///
/// Concurrent completions that write the same key race with last-writer-wins
/// semantics; there is no transactional isolation across calls.
pub struct SessionStore {
    inner: RwLock<Option<Attached>>,
}

impl SessionStore {
    /// Create a session store with no storage attached
    ///
    /// Every accessor returns [`SessionError::NotAttached`] until
    /// [`SessionStore::attach`] succeeds.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Create a session store backed by in-process memory
    ///
    /// Intended for tests and throwaway sessions; nothing survives the
    /// process.
    pub fn in_memory() -> Self {
        Self {
            inner: RwLock::new(Some(Attached {
                backend: Arc::new(MemoryStorage::new()),
                snapshot: SessionSnapshot::default(),
            })),
        }
    }

    /// Attach a storage backend, loading any previously persisted session
    pub async fn attach(&self, backend: Arc<dyn StorageBackend>) -> Result<(), SessionError> {
        let snapshot = if backend.exists(SESSION_DOCUMENT_PATH) {
            let raw = backend.read(SESSION_DOCUMENT_PATH).await?;
            serde_json::from_slice(&raw).map_err(|e| {
                tracing::error!("Failed to deserialize session document: {}", e);
                StorageError::Format(format!("session document is not valid JSON: {}", e))
            })?
        } else {
            tracing::debug!("No persisted session document found, starting empty");
            SessionSnapshot::default()
        };

        let mut guard = self.inner.write().expect("session lock poisoned");
        *guard = Some(Attached { backend, snapshot });
        Ok(())
    }

    /// Whether a storage backend is attached
    pub fn is_attached(&self) -> bool {
        self.inner
            .read()
            .expect("session lock poisoned")
            .is_some()
    }

    /// Get the value stored under `key`
    ///
    /// `Ok(None)` means the key is absent; `Err(NotAttached)` means the
    /// store cannot serve reads at all.
    pub fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let guard = self.inner.read().expect("session lock poisoned");
        let attached = guard.as_ref().ok_or(SessionError::NotAttached)?;
        Ok(attached.snapshot.values.get(key).cloned())
    }

    /// Set `key` to `value` and persist the session document
    pub async fn set(&self, key: &str, value: impl Into<String>) -> Result<(), SessionError> {
        let (backend, snapshot) = {
            let mut guard = self.inner.write().expect("session lock poisoned");
            let attached = guard.as_mut().ok_or(SessionError::NotAttached)?;
            attached
                .snapshot
                .values
                .insert(key.to_string(), value.into());
            (attached.backend.clone(), attached.snapshot.clone())
        };
        Self::persist(&backend, &snapshot).await
    }

    /// Remove `key` and persist the session document
    pub async fn remove(&self, key: &str) -> Result<(), SessionError> {
        let (backend, snapshot) = {
            let mut guard = self.inner.write().expect("session lock poisoned");
            let attached = guard.as_mut().ok_or(SessionError::NotAttached)?;
            attached.snapshot.values.remove(key);
            (attached.backend.clone(), attached.snapshot.clone())
        };
        Self::persist(&backend, &snapshot).await
    }

    /// Clear all keys and the component map, persisting the empty document
    ///
    /// Used on account/user deletion and sign-out.
    pub async fn clear(&self) -> Result<(), SessionError> {
        let (backend, snapshot) = {
            let mut guard = self.inner.write().expect("session lock poisoned");
            let attached = guard.as_mut().ok_or(SessionError::NotAttached)?;
            attached.snapshot.values.clear();
            attached.snapshot.components.clear();
            (attached.backend.clone(), attached.snapshot.clone())
        };
        tracing::info!("Session cleared");
        Self::persist(&backend, &snapshot).await
    }

    /// Look up the component id registered under a component name
    pub fn component_id(&self, name: &str) -> Result<Option<String>, SessionError> {
        let guard = self.inner.read().expect("session lock poisoned");
        let attached = guard.as_ref().ok_or(SessionError::NotAttached)?;
        Ok(attached.snapshot.components.get(name).cloned())
    }

    /// Register a component-name → component-id mapping
    pub async fn set_component_id(
        &self,
        name: impl Into<String>,
        cid: impl Into<String>,
    ) -> Result<(), SessionError> {
        let name = name.into();
        let cid = cid.into();
        let (backend, snapshot) = {
            let mut guard = self.inner.write().expect("session lock poisoned");
            let attached = guard.as_mut().ok_or(SessionError::NotAttached)?;
            attached.snapshot.components.insert(name.clone(), cid);
            (attached.backend.clone(), attached.snapshot.clone())
        };
        tracing::debug!("Registered component mapping: {}", name);
        Self::persist(&backend, &snapshot).await
    }

    /// Remove a component-name → component-id mapping
    pub async fn remove_component(&self, name: &str) -> Result<(), SessionError> {
        let (backend, snapshot) = {
            let mut guard = self.inner.write().expect("session lock poisoned");
            let attached = guard.as_mut().ok_or(SessionError::NotAttached)?;
            attached.snapshot.components.remove(name);
            (attached.backend.clone(), attached.snapshot.clone())
        };
        tracing::debug!("Removed component mapping: {}", name);
        Self::persist(&backend, &snapshot).await
    }

    /// Snapshot of the full component map
    pub fn components(&self) -> Result<HashMap<String, String>, SessionError> {
        let guard = self.inner.read().expect("session lock poisoned");
        let attached = guard.as_ref().ok_or(SessionError::NotAttached)?;
        Ok(attached.snapshot.components.clone())
    }

    /// Stored bearer token, if any
    pub fn auth_token(&self) -> Result<Option<String>, SessionError> {
        self.get(KEY_AUTH_TOKEN)
    }

    /// Stored device token, if any
    pub fn device_token(&self) -> Result<Option<String>, SessionError> {
        self.get(KEY_DEVICE_TOKEN)
    }

    async fn persist(
        backend: &Arc<dyn StorageBackend>,
        snapshot: &SessionSnapshot,
    ) -> Result<(), SessionError> {
        let json = serde_json::to_vec_pretty(snapshot).map_err(|e| {
            tracing::error!("Failed to serialize session document: {}", e);
            StorageError::Format(format!("JSON serialization failed: {}", e))
        })?;
        backend.write(SESSION_DOCUMENT_PATH, &json).await?;
        Ok(())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn detached_store_reports_not_attached() {
        let store = SessionStore::new();
        assert!(!store.is_attached());
        assert!(matches!(
            store.get(KEY_AUTH_TOKEN),
            Err(SessionError::NotAttached)
        ));
        assert!(matches!(
            store.set(KEY_AUTH_TOKEN, "t").await,
            Err(SessionError::NotAttached)
        ));
        assert!(matches!(
            store.component_id("temp"),
            Err(SessionError::NotAttached)
        ));
    }

    #[tokio::test]
    async fn absent_key_is_none_not_an_error() {
        let store = SessionStore::in_memory();
        assert_eq!(store.get(KEY_AUTH_TOKEN).unwrap(), None);
    }

    #[tokio::test]
    async fn set_get_remove_roundtrip() {
        let store = SessionStore::in_memory();

        store.set(KEY_AUTH_TOKEN, "bearer-123").await.unwrap();
        assert_eq!(
            store.get(KEY_AUTH_TOKEN).unwrap(),
            Some("bearer-123".to_string())
        );

        store.remove(KEY_AUTH_TOKEN).await.unwrap();
        assert_eq!(store.get(KEY_AUTH_TOKEN).unwrap(), None);
    }

    #[tokio::test]
    async fn clear_wipes_values_and_components() {
        let store = SessionStore::in_memory();
        store.set(KEY_ACCOUNT_ID, "acc-1").await.unwrap();
        store.set_component_id("temp", "cid-1").await.unwrap();

        store.clear().await.unwrap();

        assert_eq!(store.get(KEY_ACCOUNT_ID).unwrap(), None);
        assert_eq!(store.component_id("temp").unwrap(), None);
        assert!(store.components().unwrap().is_empty());
    }

    #[tokio::test]
    async fn session_survives_reattach() {
        let backend: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());

        let store = SessionStore::new();
        store.attach(backend.clone()).await.unwrap();
        store.set(KEY_DEVICE_ID, "dev-42").await.unwrap();
        store.set_component_id("temp", "cid-9").await.unwrap();
        drop(store);

        let restored = SessionStore::new();
        restored.attach(backend).await.unwrap();
        assert_eq!(
            restored.get(KEY_DEVICE_ID).unwrap(),
            Some("dev-42".to_string())
        );
        assert_eq!(
            restored.component_id("temp").unwrap(),
            Some("cid-9".to_string())
        );
    }

    #[tokio::test]
    async fn component_map_overwrites_and_removes() {
        let store = SessionStore::in_memory();

        store.set_component_id("temp", "cid-1").await.unwrap();
        store.set_component_id("temp", "cid-2").await.unwrap();
        assert_eq!(
            store.component_id("temp").unwrap(),
            Some("cid-2".to_string())
        );

        store.remove_component("temp").await.unwrap();
        assert_eq!(store.component_id("temp").unwrap(), None);
    }
}
