use crate::entitlements::Tier;
use crate::storage::ObjectMeta;
use serde::Serialize;

/// Audio extensions the catalog recognizes. Everything else in the bucket
/// (artwork, documents) is invisible to browsing and search.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "wav", "flac", "ogg"];

pub fn is_audio_key(key: &str) -> bool {
    key.rsplit_once('.')
        .is_some_and(|(_, ext)| AUDIO_EXTENSIONS.iter().any(|a| ext.eq_ignore_ascii_case(a)))
}

/// One playable item, derived from an object listing entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackEntry {
    pub key: String,
    /// Basename of the key.
    pub name: String,
    /// Key minus the basename, empty for root-level objects.
    pub folder: String,
    pub size: u64,
    #[serde(rename = "lastModified", skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl From<ObjectMeta> for TrackEntry {
    fn from(meta: ObjectMeta) -> Self {
        let (folder, name) = match meta.key.rsplit_once('/') {
            Some((folder, name)) => (folder.to_string(), name.to_string()),
            None => (String::new(), meta.key.clone()),
        };
        TrackEntry {
            key: meta.key,
            name,
            folder,
            size: meta.size,
            last_modified: meta.last_modified,
        }
    }
}

/// One page of browsing results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackPage {
    pub items: Vec<TrackEntry>,
    #[serde(rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

/// A first-level folder with its access tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderEntry {
    pub prefix: String,
    /// Prefix without the trailing slash.
    pub label: String,
    pub tier: Tier,
}
