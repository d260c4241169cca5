//! Loove Server Library
//!
//! Music catalog and per-user library backed entirely by an object-storage
//! bucket used as a document store. This library exposes the internal
//! modules for testing and reuse.

pub mod catalog;
pub mod config;
pub mod documents;
pub mod entitlements;
pub mod notifications;
pub mod storage;

// Re-export commonly used types for convenience
pub use catalog::{CatalogIndex, CatalogIndexConfig};
pub use documents::{DocumentStore, Plan};
pub use entitlements::{EntitlementGate, GateError, Tier};
pub use notifications::{NotificationScheduler, PushDelivery};
pub use storage::{BlobStore, FsBlobStore, MemoryBlobStore, StorageError};
