//! Content catalog over the bucket's audio objects.
//!
//! The catalog is derived state: the bucket listing is the only source of
//! truth, and the index keeps a time-boxed in-memory snapshot of it for
//! global search. Folder and prefix browsing always hit the live listing.

mod index;
mod models;

pub use index::{CatalogIndex, CatalogIndexConfig};
pub use models::{is_audio_key, FolderEntry, TrackEntry, TrackPage};
