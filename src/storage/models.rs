use serde::{Deserialize, Serialize};

/// Metadata for one stored object, as returned by listing calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
    /// RFC3339, absent when the backend does not track it.
    #[serde(rename = "lastModified", skip_serializing_if = "Option::is_none", default)]
    pub last_modified: Option<String>,
}

/// One page of a paginated listing.
///
/// `next_cursor` is an opaque token; `None` means the listing is exhausted.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub objects: Vec<ObjectMeta>,
    pub next_cursor: Option<String>,
}
