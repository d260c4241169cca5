use super::keys;
use super::models::{
    Entitlements, FavoritesDoc, HistoryDoc, HistoryEntry, Plan, Playlist, PlaylistsDoc,
    Purchase, PushSubscription, HISTORY_CAP,
};
use crate::storage::{get_json, put_json, BlobStore, StorageError};
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("email already registered: {0}")]
    EmailInUse(String),

    #[error("playlist not found: {0}")]
    PlaylistNotFound(String),

    #[error("storage unavailable: {0}")]
    Upstream(#[source] StorageError),
}

impl From<StorageError> for DocumentError {
    fn from(err: StorageError) -> Self {
        DocumentError::Upstream(err)
    }
}

/// Typed repository layer over the bucket's `db/` document tree.
///
/// Every mutation is a read-modify-write of one whole document and is
/// last-writer-wins, see the module docs.
pub struct DocumentStore {
    blobs: Arc<dyn BlobStore>,
}

pub(super) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Reads a document, treating a missing key as the default value.
async fn read_or_default<T: serde::de::DeserializeOwned + Default>(
    blobs: &dyn BlobStore,
    key: &str,
) -> Result<T, DocumentError> {
    match get_json(blobs, key).await {
        Ok(doc) => Ok(doc),
        Err(StorageError::NotFound(_)) => Ok(T::default()),
        Err(err) => Err(err.into()),
    }
}

impl DocumentStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    pub(super) fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    // ----- favorites -----

    /// Missing favorites document reads as an empty set.
    pub async fn read_favorites(&self, uid: &str) -> Result<FavoritesDoc, DocumentError> {
        read_or_default(self.blobs(), &keys::favorites(uid)).await
    }

    /// Adds `key` to the favorites set. Idempotent.
    pub async fn add_favorite(&self, uid: &str, key: &str) -> Result<(), DocumentError> {
        let mut doc = self.read_favorites(uid).await?;
        if !doc.items.iter().any(|k| k == key) {
            doc.items.push(key.to_string());
        }
        put_json(self.blobs(), &keys::favorites(uid), &doc).await?;
        Ok(())
    }

    pub async fn remove_favorite(&self, uid: &str, key: &str) -> Result<(), DocumentError> {
        let mut doc = self.read_favorites(uid).await?;
        doc.items.retain(|k| k != key);
        put_json(self.blobs(), &keys::favorites(uid), &doc).await?;
        Ok(())
    }

    // ----- history -----

    pub async fn read_history(&self, uid: &str) -> Result<HistoryDoc, DocumentError> {
        read_or_default(self.blobs(), &keys::history(uid)).await
    }

    /// Prepends a play record, dropping the oldest entries beyond the cap.
    pub async fn push_history(&self, uid: &str, key: &str) -> Result<(), DocumentError> {
        let mut doc = self.read_history(uid).await?;
        doc.items.insert(
            0,
            HistoryEntry {
                key: key.to_string(),
                at: now_rfc3339(),
            },
        );
        doc.items.truncate(HISTORY_CAP);
        put_json(self.blobs(), &keys::history(uid), &doc).await?;
        Ok(())
    }

    // ----- playlists -----

    pub async fn read_playlists(&self, uid: &str) -> Result<PlaylistsDoc, DocumentError> {
        read_or_default(self.blobs(), &keys::playlists(uid)).await
    }

    /// Creates an empty playlist and returns its generated id.
    pub async fn create_playlist(&self, uid: &str, name: &str) -> Result<String, DocumentError> {
        let mut doc = self.read_playlists(uid).await?;
        let id = random_playlist_id();
        doc.lists.push(Playlist {
            id: id.clone(),
            name: name.to_string(),
            items: Vec::new(),
            created_at: now_rfc3339(),
            updated_at: None,
        });
        put_json(self.blobs(), &keys::playlists(uid), &doc).await?;
        Ok(id)
    }

    pub async fn rename_playlist(
        &self,
        uid: &str,
        playlist_id: &str,
        name: &str,
    ) -> Result<(), DocumentError> {
        self.update_playlist(uid, playlist_id, |playlist| {
            playlist.name = name.to_string();
        })
        .await
    }

    pub async fn delete_playlist(&self, uid: &str, playlist_id: &str) -> Result<(), DocumentError> {
        let mut doc = self.read_playlists(uid).await?;
        doc.lists.retain(|p| p.id != playlist_id);
        put_json(self.blobs(), &keys::playlists(uid), &doc).await?;
        Ok(())
    }

    /// Adds a track to a playlist, keeping `items` deduplicated.
    pub async fn add_playlist_track(
        &self,
        uid: &str,
        playlist_id: &str,
        key: &str,
    ) -> Result<(), DocumentError> {
        self.update_playlist(uid, playlist_id, |playlist| {
            if !playlist.items.iter().any(|k| k == key) {
                playlist.items.push(key.to_string());
            }
        })
        .await
    }

    pub async fn remove_playlist_track(
        &self,
        uid: &str,
        playlist_id: &str,
        key: &str,
    ) -> Result<(), DocumentError> {
        self.update_playlist(uid, playlist_id, |playlist| {
            playlist.items.retain(|k| k != key);
        })
        .await
    }

    async fn update_playlist<F>(
        &self,
        uid: &str,
        playlist_id: &str,
        mutate: F,
    ) -> Result<(), DocumentError>
    where
        F: FnOnce(&mut Playlist),
    {
        let mut doc = self.read_playlists(uid).await?;
        let playlist = doc
            .lists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .ok_or_else(|| DocumentError::PlaylistNotFound(playlist_id.to_string()))?;
        mutate(playlist);
        playlist.updated_at = Some(now_rfc3339());
        put_json(self.blobs(), &keys::playlists(uid), &doc).await?;
        Ok(())
    }

    // ----- entitlements -----

    /// Missing entitlements read as the free plan.
    pub async fn get_entitlements(&self, uid: &str) -> Result<Entitlements, DocumentError> {
        read_or_default(self.blobs(), &keys::entitlements(uid)).await
    }

    /// Switches the plan, appending to the purchase history and refreshing
    /// `updatedAt`.
    pub async fn set_entitlements(
        &self,
        uid: &str,
        plan: Plan,
        source: Option<String>,
    ) -> Result<Entitlements, DocumentError> {
        let mut ent = self.get_entitlements(uid).await?;
        let now = now_rfc3339();
        ent.plan = plan;
        ent.purchases.push(Purchase {
            plan,
            at: now.clone(),
            source,
        });
        ent.updated_at = Some(now);
        put_json(self.blobs(), &keys::entitlements(uid), &ent).await?;
        Ok(ent)
    }

    // ----- push subscriptions -----

    pub async fn get_push_subscription(
        &self,
        uid: &str,
    ) -> Result<Option<PushSubscription>, DocumentError> {
        match get_json(self.blobs(), &keys::push_subscription(uid)).await {
            Ok(sub) => Ok(Some(sub)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn save_push_subscription(
        &self,
        uid: &str,
        subscription: &PushSubscription,
    ) -> Result<(), DocumentError> {
        put_json(self.blobs(), &keys::push_subscription(uid), subscription).await?;
        Ok(())
    }
}

/// Opaque playlist id, unique within one user's playlists document.
fn random_playlist_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    (0..16)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;

    fn store() -> DocumentStore {
        DocumentStore::new(Arc::new(MemoryBlobStore::new()))
    }

    #[tokio::test]
    async fn test_read_favorites_without_document_is_empty() {
        let docs = store();
        let fav = docs.read_favorites("u1").await.unwrap();
        assert!(fav.items.is_empty());
    }

    #[tokio::test]
    async fn test_add_favorite_is_idempotent() {
        let docs = store();
        docs.add_favorite("u1", "pop/a.mp3").await.unwrap();
        docs.add_favorite("u1", "pop/a.mp3").await.unwrap();
        let fav = docs.read_favorites("u1").await.unwrap();
        assert_eq!(fav.items, vec!["pop/a.mp3".to_string()]);
    }

    #[tokio::test]
    async fn test_remove_favorite_missing_key_is_noop() {
        let docs = store();
        docs.add_favorite("u1", "pop/a.mp3").await.unwrap();
        docs.remove_favorite("u1", "pop/b.mp3").await.unwrap();
        let fav = docs.read_favorites("u1").await.unwrap();
        assert_eq!(fav.items, vec!["pop/a.mp3".to_string()]);
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_capped() {
        let docs = store();
        for i in 0..(HISTORY_CAP + 1) {
            docs.push_history("u1", &format!("pop/{i}.mp3")).await.unwrap();
        }
        let history = docs.read_history("u1").await.unwrap();
        assert_eq!(history.items.len(), HISTORY_CAP);
        assert_eq!(history.items[0].key, format!("pop/{}.mp3", HISTORY_CAP));
        // The very first play fell off the end.
        assert_eq!(history.items.last().unwrap().key, "pop/1.mp3");
    }

    #[tokio::test]
    async fn test_playlist_crud_roundtrip() {
        let docs = store();
        let id = docs.create_playlist("u1", "roadtrip").await.unwrap();

        docs.add_playlist_track("u1", &id, "pop/a.mp3").await.unwrap();
        docs.add_playlist_track("u1", &id, "rock/b.mp3").await.unwrap();
        docs.add_playlist_track("u1", &id, "pop/a.mp3").await.unwrap();

        let doc = docs.read_playlists("u1").await.unwrap();
        assert_eq!(doc.lists.len(), 1);
        let playlist = &doc.lists[0];
        assert_eq!(playlist.name, "roadtrip");
        assert_eq!(playlist.items, vec!["pop/a.mp3", "rock/b.mp3"]);
        assert!(playlist.updated_at.is_some());

        docs.remove_playlist_track("u1", &id, "pop/a.mp3").await.unwrap();
        docs.rename_playlist("u1", &id, "summer").await.unwrap();
        let doc = docs.read_playlists("u1").await.unwrap();
        assert_eq!(doc.lists[0].name, "summer");
        assert_eq!(doc.lists[0].items, vec!["rock/b.mp3"]);

        docs.delete_playlist("u1", &id).await.unwrap();
        assert!(docs.read_playlists("u1").await.unwrap().lists.is_empty());
    }

    #[tokio::test]
    async fn test_playlist_mutation_requires_existing_playlist() {
        let docs = store();
        let err = docs
            .add_playlist_track("u1", "missing", "pop/a.mp3")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::PlaylistNotFound(_)));
    }

    #[tokio::test]
    async fn test_entitlements_default_to_free_plan() {
        let docs = store();
        let ent = docs.get_entitlements("u1").await.unwrap();
        assert_eq!(ent.plan, Plan::Free);
    }

    #[tokio::test]
    async fn test_set_entitlements_appends_purchase_history() {
        let docs = store();
        docs.set_entitlements("u1", Plan::Premium, Some("stripe".into()))
            .await
            .unwrap();
        let ent = docs.set_entitlements("u1", Plan::Gold, None).await.unwrap();
        assert_eq!(ent.plan, Plan::Gold);
        assert_eq!(ent.purchases.len(), 2);
        assert_eq!(ent.purchases[0].plan, Plan::Premium);
        assert!(ent.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_push_subscription_roundtrip() {
        let docs = store();
        assert!(docs.get_push_subscription("u1").await.unwrap().is_none());
        let sub = PushSubscription {
            endpoint: "https://push.example.com/ep".into(),
            keys: crate::documents::PushKeys {
                p256dh: "pk".into(),
                auth: "ak".into(),
            },
        };
        docs.save_push_subscription("u1", &sub).await.unwrap();
        assert_eq!(docs.get_push_subscription("u1").await.unwrap(), Some(sub));
    }
}
