use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Mutex;

/// Storage backend trait for persisting SDK state
///
/// Abstracts the document store the session layer writes through, so the
/// same session code can target the OS keychain, the filesystem, or an
/// in-memory map in tests.
pub trait StorageBackend: Send + Sync {
    /// Write a document to storage at the specified path
    fn write(
        &self,
        path: &str,
        data: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>>;

    /// Read a document from storage at the specified path
    fn read(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, StorageError>> + Send + '_>>;

    /// Check if a document exists at the specified path
    fn exists(&self, path: &str) -> bool;

    /// Remove the document at the specified path
    fn remove(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>>;
}

/// Storage errors
#[derive(Debug)]
pub enum StorageError {
    /// IO error
    Io(std::io::Error),
    /// Serialization or document-format error
    Format(String),
    /// Keyring error
    Keyring(String),
    /// Path error
    Path(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "IO error: {}", e),
            StorageError::Format(msg) => write!(f, "Format error: {}", msg),
            StorageError::Keyring(msg) => write!(f, "Keyring error: {}", msg),
            StorageError::Path(msg) => write!(f, "Path error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl From<keyring::Error> for StorageError {
    fn from(err: keyring::Error) -> Self {
        StorageError::Keyring(err.to_string())
    }
}

/// Keyring-based storage for credential material
///
/// Uses the OS-native credential store:
/// - macOS: Keychain
/// - Linux: Secret Service API (freedesktop.org)
/// - Windows: Credential Manager
pub struct KeyringStorage {
    service_name: String,
}

impl KeyringStorage {
    /// Create a new keyring storage with the specified service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    fn entry(&self, path: &str) -> Result<keyring::Entry, StorageError> {
        // The document path doubles as the account identifier
        keyring::Entry::new(&self.service_name, path)
            .map_err(|e| StorageError::Keyring(format!("Failed to create keyring entry: {}", e)))
    }
}

impl StorageBackend for KeyringStorage {
    fn write(
        &self,
        path: &str,
        data: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let path = path.to_string();
        let data = data.to_vec();
        let service_name = self.service_name.clone();

        Box::pin(async move {
            let entry = keyring::Entry::new(&service_name, &path).map_err(|e| {
                StorageError::Keyring(format!("Failed to create keyring entry: {}", e))
            })?;

            let data_str = String::from_utf8(data)
                .map_err(|e| StorageError::Format(format!("Invalid UTF-8 data: {}", e)))?;

            entry.set_password(&data_str)?;
            tracing::debug!(
                "Stored document in keyring: service={}, path={}",
                service_name,
                path
            );
            Ok(())
        })
    }

    fn read(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, StorageError>> + Send + '_>> {
        let path = path.to_string();
        let service_name = self.service_name.clone();

        Box::pin(async move {
            let entry = keyring::Entry::new(&service_name, &path).map_err(|e| {
                StorageError::Keyring(format!("Failed to create keyring entry: {}", e))
            })?;

            let password = entry.get_password()?;
            Ok(password.into_bytes())
        })
    }

    fn exists(&self, path: &str) -> bool {
        if let Ok(entry) = self.entry(path) {
            entry.get_password().is_ok()
        } else {
            false
        }
    }

    fn remove(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let path = path.to_string();
        let service_name = self.service_name.clone();

        Box::pin(async move {
            let entry = keyring::Entry::new(&service_name, &path).map_err(|e| {
                StorageError::Keyring(format!("Failed to create keyring entry: {}", e))
            })?;

            entry.delete_credential()?;
            tracing::debug!(
                "Removed document from keyring: service={}, path={}",
                service_name,
                path
            );
            Ok(())
        })
    }
}

/// Filesystem-based storage
///
/// Documents are stored unencrypted on disk. Prefer `KeyringStorage` for
/// token material when an OS credential store is available; this backend is
/// the fallback for headless and containerized environments.
pub struct FilesystemStorage {
    base_path: PathBuf,
}

impl FilesystemStorage {
    /// Create a new filesystem storage rooted at the specified base path
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();

        if !base_path.exists() {
            std::fs::create_dir_all(&base_path)?;
        }

        Ok(Self { base_path })
    }

    /// Create a filesystem storage under `~/.stratus/<instance_id>`
    ///
    /// Each instance id gets an isolated directory, so multiple applications
    /// embedding the SDK do not share session state.
    pub fn for_instance(instance_id: &str) -> Result<Self, StorageError> {
        let home = dirs::home_dir()
            .ok_or_else(|| StorageError::Path("Cannot determine home directory".to_string()))?;
        Self::new(home.join(".stratus").join(instance_id))
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

impl StorageBackend for FilesystemStorage {
    fn write(
        &self,
        path: &str,
        data: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let full_path = self.resolve_path(path);
        let data = data.to_vec();

        Box::pin(async move {
            if let Some(parent) = full_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            tokio::fs::write(&full_path, data).await?;
            tracing::debug!("Wrote document to filesystem: {:?}", full_path);
            Ok(())
        })
    }

    fn read(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, StorageError>> + Send + '_>> {
        let full_path = self.resolve_path(path);

        Box::pin(async move {
            let data = tokio::fs::read(&full_path).await?;
            tracing::debug!("Read document from filesystem: {:?}", full_path);
            Ok(data)
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve_path(path).exists()
    }

    fn remove(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let full_path = self.resolve_path(path);

        Box::pin(async move {
            tokio::fs::remove_file(&full_path).await?;
            tracing::debug!("Removed document from filesystem: {:?}", full_path);
            Ok(())
        })
    }
}

/// In-memory storage backend
///
/// Nothing survives the process; intended for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    documents: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn write(
        &self,
        path: &str,
        data: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let path = path.to_string();
        let data = data.to_vec();

        Box::pin(async move {
            self.documents
                .lock()
                .expect("storage mutex poisoned")
                .insert(path, data);
            Ok(())
        })
    }

    fn read(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, StorageError>> + Send + '_>> {
        let path = path.to_string();

        Box::pin(async move {
            self.documents
                .lock()
                .expect("storage mutex poisoned")
                .get(&path)
                .cloned()
                .ok_or_else(|| {
                    StorageError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("no document at {}", path),
                    ))
                })
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.documents
            .lock()
            .expect("storage mutex poisoned")
            .contains_key(path)
    }

    fn remove(
        &self,
        path: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let path = path.to_string();

        Box::pin(async move {
            self.documents
                .lock()
                .expect("storage mutex poisoned")
                .remove(&path);
            Ok(())
        })
    }
}
