//! Document store over the bucket.
//!
//! Per-user collections (profile, favorites, history, playlists,
//! entitlements, push subscription) are whole JSON documents under `db/`,
//! one blob per collection per user. Reads fall back to an empty default
//! when the document does not exist; writes overwrite the whole document.
//!
//! There is no conditional write in the bucket, so every read-modify-write
//! here is last-writer-wins at document granularity. Two concurrent
//! mutations of the same user's collection can lose one of the updates.
//! Callers must treat collection writes accordingly.

mod accounts;
pub mod keys;
mod models;
mod store;

pub use models::{
    Entitlements, FavoritesDoc, HistoryDoc, HistoryEntry, Plan, Playlist, PlaylistsDoc,
    Purchase, PushKeys, PushSubscription, UserProfile, UserTags, HISTORY_CAP,
};
pub use store::{DocumentError, DocumentStore};
