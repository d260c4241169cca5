//! Object storage adapter.
//!
//! The whole server persists through a single flat bucket: media objects
//! under genre folders, JSON documents under `db/`. This module defines the
//! store contract plus two implementations, a local-directory bucket for
//! deployments and an in-memory one for tests.

mod blob_store;
mod fs_store;
mod memory_store;
mod models;

pub use blob_store::{get_json, put_json, BlobStore, StorageError};
pub use fs_store::FsBlobStore;
pub use memory_store::MemoryBlobStore;
pub use models::{ObjectMeta, ObjectPage};
