use super::tier::{parent_folder, Tier};
use crate::documents::{DocumentError, DocumentStore};
use crate::storage::{BlobStore, StorageError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_SIGN_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum GateError {
    /// The caller's plan does not unlock the tier the content requires.
    /// Carries the required tier so the caller can present the right
    /// upsell. This is a domain signal, not a generic authorization
    /// failure.
    #[error("{0} plan required")]
    UpgradeRequired(Tier),

    #[error("storage unavailable: {0}")]
    Upstream(#[source] anyhow::Error),
}

impl From<StorageError> for GateError {
    fn from(err: StorageError) -> Self {
        GateError::Upstream(err.into())
    }
}

impl From<DocumentError> for GateError {
    fn from(err: DocumentError) -> Self {
        GateError::Upstream(err.into())
    }
}

/// Decides stream access and mints signed URLs for authorized requests.
pub struct EntitlementGate {
    documents: Arc<DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    sign_ttl: Duration,
}

impl EntitlementGate {
    pub fn new(documents: Arc<DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self::with_sign_ttl(documents, blobs, DEFAULT_SIGN_TTL)
    }

    pub fn with_sign_ttl(
        documents: Arc<DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        sign_ttl: Duration,
    ) -> Self {
        Self {
            documents,
            blobs,
            sign_ttl,
        }
    }

    /// Tier required to stream `key`, from its immediate parent folder.
    pub fn required_tier(key: &str) -> Tier {
        Tier::of_path(parent_folder(key))
    }

    /// Authorizes the user against the key's tier and returns a signed,
    /// time-limited stream URL.
    ///
    /// On success the play is counted against the top-level genre segment
    /// of the folder, best-effort: a tag failure is logged and never fails
    /// the stream response.
    pub async fn stream_url(&self, uid: &str, key: &str) -> Result<String, GateError> {
        let folder = parent_folder(key);
        let required = Tier::of_path(folder);
        let entitlements = self.documents.get_entitlements(uid).await?;
        if !required.accessible_with(entitlements.plan) {
            return Err(GateError::UpgradeRequired(required));
        }

        let url = self.blobs.signed_get_url(key, self.sign_ttl).await?;

        let genre = folder.split('/').next().unwrap_or("").trim();
        if !genre.is_empty() {
            if let Err(err) = self.documents.add_play_tag(uid, genre).await {
                warn!("failed to record play tag for user {uid}: {err}");
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Plan;
    use crate::storage::MemoryBlobStore;

    async fn fixture() -> (Arc<MemoryBlobStore>, Arc<DocumentStore>, EntitlementGate) {
        let blobs = Arc::new(MemoryBlobStore::new());
        for key in ["pop/a.mp3", "premium/sub/b.mp3", "GOLD HITS/c.mp3"] {
            blobs.put(key, vec![0], "audio/mpeg").await.unwrap();
        }
        let documents = Arc::new(DocumentStore::new(blobs.clone()));
        let gate = EntitlementGate::new(documents.clone(), blobs.clone());
        (blobs, documents, gate)
    }

    #[tokio::test]
    async fn test_free_user_streams_free_tier() {
        let (_, _, gate) = fixture().await;
        let url = gate.stream_url("u1", "pop/a.mp3").await.unwrap();
        assert!(url.contains("pop/a.mp3"));
    }

    #[tokio::test]
    async fn test_free_user_denied_premium_with_required_tier() {
        let (_, _, gate) = fixture().await;
        let err = gate.stream_url("u1", "premium/sub/b.mp3").await.unwrap_err();
        match err {
            GateError::UpgradeRequired(tier) => assert_eq!(tier, Tier::Premium),
            other => panic!("expected UpgradeRequired, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_premium_user_denied_gold() {
        let (_, documents, gate) = fixture().await;
        documents
            .set_entitlements("u1", Plan::Premium, None)
            .await
            .unwrap();
        let err = gate.stream_url("u1", "GOLD HITS/c.mp3").await.unwrap_err();
        assert!(matches!(err, GateError::UpgradeRequired(Tier::Gold)));
    }

    #[tokio::test]
    async fn test_gold_user_streams_every_tier() {
        let (_, documents, gate) = fixture().await;
        documents.set_entitlements("u1", Plan::Gold, None).await.unwrap();
        for key in ["pop/a.mp3", "premium/sub/b.mp3", "GOLD HITS/c.mp3"] {
            gate.stream_url("u1", key).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_successful_stream_records_genre_play_tag() {
        let (_, documents, gate) = fixture().await;
        let user = documents
            .create_user("Ana", "ana@example.com", "hash")
            .await
            .unwrap();
        gate.stream_url(&user.uid, "pop/a.mp3").await.unwrap();
        let profile = documents.get_user(&user.uid).await.unwrap().unwrap();
        assert_eq!(profile.tags.genres.get("pop"), Some(&1));
    }

    #[tokio::test]
    async fn test_stream_succeeds_when_tag_cannot_be_recorded() {
        // No profile document exists for this uid, the tag update is a
        // no-op and the stream must still succeed.
        let (_, _, gate) = fixture().await;
        gate.stream_url("ghost", "pop/a.mp3").await.unwrap();
    }
}
