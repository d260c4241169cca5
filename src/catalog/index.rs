use super::models::{is_audio_key, FolderEntry, TrackEntry, TrackPage};
use crate::entitlements::Tier;
use crate::storage::{BlobStore, ObjectMeta, StorageError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CatalogIndexConfig {
    /// How long a snapshot stays warm.
    pub ttl: Duration,
    /// Page size for bucket listing calls.
    pub page_size: usize,
    /// Maximum number of search results returned.
    pub search_cap: usize,
}

impl Default for CatalogIndexConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            page_size: 1000,
            search_cap: 500,
        }
    }
}

/// A complete audio listing of the bucket at one point in time.
struct Snapshot {
    objects: Vec<ObjectMeta>,
    captured_at: Instant,
}

/// Process-wide catalog cache.
///
/// The snapshot is replaced wholesale under the write lock, so readers
/// always observe a complete listing. Concurrent refreshes are not
/// de-duplicated; both walk the bucket and the later result wins, which is
/// benign since any snapshot is internally consistent.
pub struct CatalogIndex {
    blobs: Arc<dyn BlobStore>,
    config: CatalogIndexConfig,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
}

impl CatalogIndex {
    pub fn new(blobs: Arc<dyn BlobStore>, config: CatalogIndexConfig) -> Self {
        Self {
            blobs,
            config,
            snapshot: RwLock::new(None),
        }
    }

    /// First-level folders under the bucket root, annotated with the tier
    /// their path classifies into. Computed live on every call.
    pub async fn list_folders(&self) -> Result<Vec<FolderEntry>, StorageError> {
        let prefixes = self.blobs.list_prefixes("").await?;
        Ok(prefixes
            .into_iter()
            .map(|prefix| FolderEntry {
                label: prefix.trim_end_matches('/').to_string(),
                tier: Tier::of_path(&prefix),
                prefix,
            })
            .collect())
    }

    /// One live page of audio objects under `prefix`. Bypasses the warm
    /// snapshot so it reflects current bucket state.
    pub async fn list_tracks(
        &self,
        prefix: &str,
        cursor: Option<&str>,
    ) -> Result<TrackPage, StorageError> {
        let page = self
            .blobs
            .list_objects(prefix, cursor, self.config.page_size)
            .await?;
        Ok(TrackPage {
            items: page
                .objects
                .into_iter()
                .filter(|o| is_audio_key(&o.key))
                .map(TrackEntry::from)
                .collect(),
            next_cursor: page.next_cursor,
        })
    }

    /// Global case-insensitive substring search over the warm snapshot.
    ///
    /// An empty or whitespace-only term short-circuits to prefix browsing.
    /// Results keep listing order and are capped; there is no relevance
    /// ranking.
    pub async fn search(
        &self,
        term: &str,
        prefix: &str,
        cursor: Option<&str>,
    ) -> Result<TrackPage, StorageError> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.list_tracks(prefix, cursor).await;
        }
        let snapshot = self.warm().await?;
        let items = snapshot
            .objects
            .iter()
            .filter(|o| o.key.to_lowercase().contains(&needle))
            .take(self.config.search_cap)
            .cloned()
            .map(TrackEntry::from)
            .collect();
        Ok(TrackPage {
            items,
            next_cursor: None,
        })
    }

    /// Forces the next read to walk the bucket again.
    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }

    /// Returns the warm snapshot, walking the whole bucket listing when the
    /// cache is empty or past its TTL. An empty snapshot is treated as
    /// cold, matching a bucket that was still filling on the last walk.
    async fn warm(&self) -> Result<Arc<Snapshot>, StorageError> {
        if let Some(snapshot) = self.snapshot.read().await.clone() {
            if snapshot.captured_at.elapsed() < self.config.ttl && !snapshot.objects.is_empty() {
                return Ok(snapshot);
            }
        }

        let started = Instant::now();
        let mut objects = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .blobs
                .list_objects("", cursor.as_deref(), self.config.page_size)
                .await?;
            objects.extend(page.objects.into_iter().filter(|o| is_audio_key(&o.key)));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        info!(
            "catalog index refreshed: {} tracks in {:?}",
            objects.len(),
            started.elapsed()
        );
        let snapshot = Arc::new(Snapshot {
            objects,
            captured_at: Instant::now(),
        });
        *self.snapshot.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Eagerly warms the snapshot, for startup.
    pub async fn warm_up(&self) -> Result<usize, StorageError> {
        let snapshot = self.warm().await?;
        debug!("catalog warm-up complete: {} tracks", snapshot.objects.len());
        Ok(snapshot.objects.len())
    }
}
