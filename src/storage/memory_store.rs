use super::blob_store::{BlobStore, StorageError};
use super::models::{ObjectMeta, ObjectPage};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory bucket backed by a sorted map.
///
/// Keys enumerate in lexicographic order, which matches what a real bucket
/// listing returns. The store counts `list_objects` calls so tests can
/// assert how often the catalog walks the bucket.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    list_calls: AtomicUsize,
}

struct StoredObject {
    bytes: Vec<u8>,
    last_modified: String,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `list_objects` calls made against this store.
    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let objects = self.objects.read().await;
        objects
            .get(key)
            .map(|o| o.bytes.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let stored = StoredObject {
            bytes,
            last_modified: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        self.objects.write().await.insert(key.to_string(), stored);
        Ok(())
    }

    async fn list_prefixes(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let objects = self.objects.read().await;
        let mut prefixes = BTreeSet::new();
        for key in objects.keys() {
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            if let Some(slash) = rest.find('/') {
                prefixes.insert(format!("{prefix}{}/", &rest[..slash]));
            }
        }
        Ok(prefixes.into_iter().collect())
    }

    async fn list_objects(
        &self,
        prefix: &str,
        cursor: Option<&str>,
        max_keys: usize,
    ) -> Result<ObjectPage, StorageError> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        let objects = self.objects.read().await;
        let mut page = Vec::new();
        let mut truncated = false;
        for (key, stored) in objects.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            // Cursor is the last key of the previous page.
            if cursor.is_some_and(|c| key.as_str() <= c) {
                continue;
            }
            if page.len() == max_keys {
                truncated = true;
                break;
            }
            page.push(ObjectMeta {
                key: key.clone(),
                size: stored.bytes.len() as u64,
                last_modified: Some(stored.last_modified.clone()),
            });
        }
        let next_cursor = if truncated {
            page.last().map(|o| o.key.clone())
        } else {
            None
        };
        Ok(ObjectPage {
            objects: page,
            next_cursor,
        })
    }

    async fn signed_get_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let objects = self.objects.read().await;
        if !objects.contains_key(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        let exp = Utc::now().timestamp() + ttl.as_secs() as i64;
        Ok(format!("memory:///{key}?exp={exp}"))
    }
}
