use super::models::ObjectPage;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the storage backend.
///
/// `NotFound` is a recoverable condition for document reads (callers fall
/// back to a default document), everything else is an upstream failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage backend unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),
}

/// Contract of the object-storage bucket the server runs against.
///
/// Keys are `/`-separated paths. Listing is paginated through an opaque
/// cursor. Implementations must be cheap to share behind an `Arc`.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns the raw bytes stored under `key`.
    /// Returns Err(StorageError::NotFound) if the key does not exist.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Stores `bytes` under `key`, overwriting any previous object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), StorageError>;

    /// Returns the first-level common prefixes under `prefix`, each ending
    /// with `/` ("folders" in bucket terms).
    async fn list_prefixes(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Returns one page of at most `max_keys` objects under `prefix`,
    /// resuming from `cursor` when given.
    async fn list_objects(
        &self,
        prefix: &str,
        cursor: Option<&str>,
        max_keys: usize,
    ) -> Result<ObjectPage, StorageError>;

    /// Mints a time-limited retrieval URL for `key`.
    async fn signed_get_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;
}

/// Reads and deserializes the JSON document stored under `key`.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn BlobStore,
    key: &str,
) -> Result<T, StorageError> {
    let bytes = store.get(key).await?;
    serde_json::from_slice(&bytes)
        .map_err(|err| StorageError::Unavailable(anyhow::anyhow!("corrupt document {key}: {err}")))
}

/// Serializes `value` and stores it under `key` as pretty-printed JSON,
/// matching the layout other tooling expects to read in the bucket.
pub async fn put_json<T: Serialize>(
    store: &dyn BlobStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|err| StorageError::Unavailable(anyhow::anyhow!("serialize {key}: {err}")))?;
    store.put(key, bytes, "application/json").await
}
