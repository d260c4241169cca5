//! Bucket key layout for the `db/` document tree.
//!
//! This layout is shared with other tooling that reads the bucket directly,
//! so the patterns here must not change.

pub const NOTIFICATION_QUEUE: &str = "db/admin/notifications.json";

pub fn user_profile(uid: &str) -> String {
    format!("db/users/{uid}.json")
}

/// Secondary index used to resolve an email to a user id. The email is
/// lowercased before encoding so lookups are case-insensitive.
pub fn email_index(email: &str) -> String {
    format!("db/emails/{}.json", urlencoding::encode(&email.to_lowercase()))
}

pub fn favorites(uid: &str) -> String {
    format!("db/users/{uid}/favorites.json")
}

pub fn history(uid: &str) -> String {
    format!("db/users/{uid}/history.json")
}

pub fn playlists(uid: &str) -> String {
    format!("db/users/{uid}/playlists.json")
}

pub fn push_subscription(uid: &str) -> String {
    format!("db/users/{uid}/push.json")
}

pub fn entitlements(uid: &str) -> String {
    format!("db/entitlements/{uid}.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_index_is_lowercased_and_encoded() {
        assert_eq!(
            email_index("Ana.Silva+test@Example.COM"),
            "db/emails/ana.silva%2Btest%40example.com.json"
        );
    }

    #[test]
    fn test_user_document_keys() {
        assert_eq!(user_profile("u1"), "db/users/u1.json");
        assert_eq!(favorites("u1"), "db/users/u1/favorites.json");
        assert_eq!(entitlements("u1"), "db/entitlements/u1.json");
    }
}
