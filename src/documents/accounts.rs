//! User account documents and the email secondary index.

use super::keys;
use super::models::{EmailIndexDoc, Plan, UserProfile, UserTags};
use super::store::{now_rfc3339, DocumentError, DocumentStore};
use crate::storage::{get_json, put_json, StorageError};
use chrono::{Datelike, Utc};
use uuid::Uuid;

/// Month names as the profile tag bag stores them.
const MONTH_NAMES: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

impl DocumentStore {
    /// Creates a user with a fresh uid, seeding the profile, the email
    /// index and the empty per-user collections.
    ///
    /// The profile and index writes are not transactional; a crash in
    /// between can leave a dangling index entry, which later lookups treat
    /// as "not found".
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserProfile, DocumentError> {
        if self.find_user_by_email(email).await?.is_some() {
            return Err(DocumentError::EmailInUse(email.to_lowercase()));
        }
        let now = Utc::now();
        let profile = UserProfile {
            uid: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            pass: password_hash.to_string(),
            created_at: now_rfc3339(),
            role: "user".to_string(),
            plan: Plan::Free,
            tags: UserTags {
                month: Some(MONTH_NAMES[now.month0() as usize].to_string()),
                year: Some(now.year().to_string()),
                ..Default::default()
            },
        };
        self.save_user(&profile).await?;
        put_json(
            self.blobs(),
            &keys::favorites(&profile.uid),
            &super::models::FavoritesDoc::default(),
        )
        .await?;
        put_json(
            self.blobs(),
            &keys::history(&profile.uid),
            &super::models::HistoryDoc::default(),
        )
        .await?;
        let entitlements = super::models::Entitlements {
            plan: Plan::Free,
            purchases: Vec::new(),
            updated_at: Some(profile.created_at.clone()),
        };
        put_json(self.blobs(), &keys::entitlements(&profile.uid), &entitlements).await?;
        Ok(profile)
    }

    /// Writes the profile document and its email index entry.
    pub async fn save_user(&self, profile: &UserProfile) -> Result<(), DocumentError> {
        put_json(self.blobs(), &keys::user_profile(&profile.uid), profile).await?;
        let index = EmailIndexDoc {
            uid: profile.uid.clone(),
        };
        put_json(self.blobs(), &keys::email_index(&profile.email), &index).await?;
        Ok(())
    }

    pub async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>, DocumentError> {
        match get_json(self.blobs(), &keys::user_profile(uid)).await {
            Ok(profile) => Ok(Some(profile)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Resolves an email through the secondary index, case-insensitively.
    /// A dangling index entry resolves to `None`.
    pub async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserProfile>, DocumentError> {
        let index: EmailIndexDoc = match get_json(self.blobs(), &keys::email_index(email)).await {
            Ok(index) => index,
            Err(StorageError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        self.get_user(&index.uid).await
    }

    /// Increments the play count for `genre` on the profile tag bag.
    /// A missing profile is a no-op.
    pub async fn add_play_tag(&self, uid: &str, genre: &str) -> Result<(), DocumentError> {
        let Some(mut profile) = self.get_user(uid).await? else {
            return Ok(());
        };
        *profile.tags.genres.entry(genre.to_string()).or_insert(0) += 1;
        self.save_user(&profile).await
    }

    /// Adds session time to the profile tag bag. A missing profile is a
    /// no-op.
    pub async fn add_session_minutes(&self, uid: &str, minutes: u64) -> Result<(), DocumentError> {
        let Some(mut profile) = self.get_user(uid).await? else {
            return Ok(());
        };
        profile.tags.time_minutes += minutes.max(1);
        self.save_user(&profile).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;
    use std::sync::Arc;

    fn store() -> DocumentStore {
        DocumentStore::new(Arc::new(MemoryBlobStore::new()))
    }

    #[tokio::test]
    async fn test_create_user_seeds_collections() {
        let docs = store();
        let user = docs
            .create_user("Ana", "ana@example.com", "hash")
            .await
            .unwrap();
        assert_eq!(user.role, "user");
        assert_eq!(user.plan, Plan::Free);
        assert!(user.tags.month.is_some());

        assert!(docs.read_favorites(&user.uid).await.unwrap().items.is_empty());
        assert!(docs.read_history(&user.uid).await.unwrap().items.is_empty());
        let ent = docs.get_entitlements(&user.uid).await.unwrap();
        assert_eq!(ent.plan, Plan::Free);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected_case_insensitively() {
        let docs = store();
        docs.create_user("Ana", "ana@example.com", "hash")
            .await
            .unwrap();
        let err = docs
            .create_user("Impostor", "Ana@Example.COM", "hash2")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::EmailInUse(_)));
    }

    #[tokio::test]
    async fn test_find_user_by_email_ignores_case() {
        let docs = store();
        let created = docs
            .create_user("Ana", "ana@example.com", "hash")
            .await
            .unwrap();
        let found = docs
            .find_user_by_email("ANA@EXAMPLE.COM")
            .await
            .unwrap()
            .expect("user should resolve");
        assert_eq!(found.uid, created.uid);
    }

    #[tokio::test]
    async fn test_unknown_email_resolves_to_none() {
        let docs = store();
        assert!(docs
            .find_user_by_email("ghost@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_play_tags_accumulate_per_genre() {
        let docs = store();
        let user = docs
            .create_user("Ana", "ana@example.com", "hash")
            .await
            .unwrap();
        docs.add_play_tag(&user.uid, "pop").await.unwrap();
        docs.add_play_tag(&user.uid, "pop").await.unwrap();
        docs.add_play_tag(&user.uid, "rock").await.unwrap();

        let profile = docs.get_user(&user.uid).await.unwrap().unwrap();
        assert_eq!(profile.tags.genres.get("pop"), Some(&2));
        assert_eq!(profile.tags.genres.get("rock"), Some(&1));
    }

    #[tokio::test]
    async fn test_tag_update_for_missing_user_is_noop() {
        let docs = store();
        docs.add_play_tag("ghost", "pop").await.unwrap();
        docs.add_session_minutes("ghost", 5).await.unwrap();
    }

    #[tokio::test]
    async fn test_session_minutes_accumulate() {
        let docs = store();
        let user = docs
            .create_user("Ana", "ana@example.com", "hash")
            .await
            .unwrap();
        docs.add_session_minutes(&user.uid, 1).await.unwrap();
        docs.add_session_minutes(&user.uid, 0).await.unwrap(); // counts as 1
        let profile = docs.get_user(&user.uid).await.unwrap().unwrap();
        assert_eq!(profile.tags.time_minutes, 2);
    }
}
