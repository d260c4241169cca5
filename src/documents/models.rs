//! Document models, serialized with the exact field names the bucket holds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// History documents are capped; the oldest entries are silently dropped.
pub const HISTORY_CAP: usize = 1000;

/// Purchased plan. Gold includes premium-tier access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Premium,
    Gold,
}

impl Plan {
    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
            Plan::Gold => "gold",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form usage tags kept on the profile document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserTags {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub year: Option<String>,
    /// Play counts per top-level genre folder.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub genres: BTreeMap<String, u64>,
    /// Cumulative session minutes.
    #[serde(rename = "timeMinutes", skip_serializing_if = "is_zero", default)]
    pub time_minutes: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub name: String,
    pub email: String,
    /// Password hash, produced by the authentication layer.
    pub pass: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub role: String,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub tags: UserTags,
}

/// `db/emails/{email}.json` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailIndexDoc {
    pub uid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FavoritesDoc {
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub key: String,
    pub at: String,
}

/// Newest-first listening history, at most [`HISTORY_CAP`] entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryDoc {
    #[serde(default)]
    pub items: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    /// Ordered but deduplicated, set semantics enforced at write time.
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none", default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistsDoc {
    #[serde(default)]
    pub lists: Vec<Playlist>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub plan: Plan,
    pub at: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entitlements {
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub purchases: Vec<Purchase>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none", default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Web-push subscription as posted by the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: PushKeys,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Plan::Gold).unwrap(), "\"gold\"");
        let plan: Plan = serde_json::from_str("\"premium\"").unwrap();
        assert_eq!(plan, Plan::Premium);
    }

    #[test]
    fn test_plan_ordering_matches_tiers() {
        assert!(Plan::Free < Plan::Premium);
        assert!(Plan::Premium < Plan::Gold);
    }

    #[test]
    fn test_entitlements_default_is_free() {
        let ent: Entitlements = serde_json::from_str("{}").unwrap();
        assert_eq!(ent.plan, Plan::Free);
        assert!(ent.purchases.is_empty());
    }

    #[test]
    fn test_profile_wire_field_names() {
        let profile = UserProfile {
            uid: "u1".into(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            pass: "hash".into(),
            created_at: "2026-01-01T00:00:00Z".into(),
            role: "user".into(),
            plan: Plan::Free,
            tags: UserTags {
                time_minutes: 5,
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["createdAt"], "2026-01-01T00:00:00Z");
        assert_eq!(value["tags"]["timeMinutes"], 5);
    }
}
