//! Local key/value store adapter.
//!
//! Values are JSON-encoded under string keys. The typed API on [`LocalStore`]
//! never returns storage errors to business logic: failures are logged and
//! reported as "no data" (`None`) or an unsuccessful write (`false`).
//! [`LocalStore::fetch`] keeps "absent" and "unreadable" apart for callers
//! that write back what they read.
//!
//! There is no locking. Two in-flight read-modify-write cycles on the same
//! key race and the last write wins; callers assume a single active editor
//! per key.
//!
//! # Keys
//!
//! - `classes`: ordered list of classes
//! - `class-<classId>`: legacy roster storage for one class
//! - `attendance-<classId>`: date -> rollNumber -> status

mod memory;
mod sqlite;

pub use memory::MemoryBackend;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Key holding the ordered list of classes.
pub const CLASSES_KEY: &str = "classes";

/// Legacy roster key for a class.
pub fn roster_key(class_id: &str) -> String {
    format!("class-{}", class_id)
}

/// Attendance blob key for a class.
pub fn attendance_key(class_id: &str) -> String {
    format!("attendance-{}", class_id)
}

/// Failures inside the store. Logged by [`LocalStore`], never propagated.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
    #[error("failed to decode value for '{key}': {source}")]
    Decode {
        key: String,
        source: serde_json::Error,
    },
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

/// Raw string storage underneath [`LocalStore`].
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Result of [`LocalStore::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Missing,
    Found(T),
    /// The backend failed or the stored value did not decode. Already logged.
    Failed,
}

/// Typed JSON view over a [`KeyValueBackend`].
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl LocalStore {
    pub fn new(backend: impl KeyValueBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Store backed by a fresh in-memory map.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Reads and decodes the value under `key`.
    ///
    /// Returns `None` when the key is absent or the read fails.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.fetch(key).await {
            Fetched::Found(value) => Some(value),
            Fetched::Missing | Fetched::Failed => None,
        }
    }

    /// Like [`get`](Self::get), but tells an absent key apart from a value
    /// that could not be read or decoded. Read-modify-write callers must not
    /// write back after [`Fetched::Failed`].
    pub async fn fetch<T: DeserializeOwned>(&self, key: &str) -> Fetched<T> {
        match self.try_get(key).await {
            Ok(Some(value)) => Fetched::Found(value),
            Ok(None) => Fetched::Missing,
            Err(e) => {
                tracing::error!("Error reading data: {}", e);
                Fetched::Failed
            }
        }
    }

    /// Encodes and writes `value` under `key`. Returns `false` on failure.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match self.try_set(key, value).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error storing data: {}", e);
                false
            }
        }
    }

    /// Removes `key`. Removing an absent key succeeds.
    pub async fn remove(&self, key: &str) -> bool {
        match self.backend.remove(key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error removing data for '{}': {}", key, e);
                false
            }
        }
    }

    /// Lists stored keys; empty on failure.
    pub async fn keys(&self) -> Vec<String> {
        self.backend.keys().await.unwrap_or_else(|e| {
            tracing::error!("Error listing keys: {}", e);
            Vec::new()
        })
    }

    async fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let raw = match self.backend.get(key).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Decode {
                key: key.to_string(),
                source,
            })
    }

    async fn try_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.backend.set(key, raw).await
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use serde_json::Value;

    /// Memory backend whose reads, writes or removals can be made to fail.
    #[derive(Default)]
    pub(crate) struct FaultyBackend {
        inner: MemoryBackend,
        fail_reads: bool,
        fail_writes: bool,
        fail_removes: bool,
    }

    impl FaultyBackend {
        pub(crate) fn failing_reads(mut self) -> Self {
            self.fail_reads = true;
            self
        }

        pub(crate) fn failing_writes(mut self) -> Self {
            self.fail_writes = true;
            self
        }

        pub(crate) fn failing_removes(mut self) -> Self {
            self.fail_removes = true;
            self
        }

        /// Stores `value` directly, bypassing the failure switches.
        pub(crate) async fn seeded(self, key: &str, value: Value) -> Self {
            self.inner.set(key, value.to_string()).await.unwrap();
            self
        }

        fn check(failing: bool) -> Result<(), StorageError> {
            if failing {
                Err(StorageError::Backend("disk unavailable".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl KeyValueBackend for FaultyBackend {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Self::check(self.fail_reads)?;
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
            Self::check(self.fail_writes)?;
            self.inner.set(key, value).await
        }
        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            Self::check(self.fail_removes)?;
            self.inner.remove(key).await
        }
        async fn keys(&self) -> Result<Vec<String>, StorageError> {
            Self::check(self.fail_reads)?;
            self.inner.keys().await
        }
    }
}
