//! Scheduled push notifications.
//!
//! A single shared queue document in the bucket acts as a durable
//! best-effort work queue: jobs are appended by admin actions and marked
//! sent in place by the scheduler. Delivery is at-least-once per job and
//! best-effort per target.

mod models;
mod push;
mod scheduler;

pub use models::{NotificationJob, NotificationQueueDoc, PushPayload};
pub use push::{NoopPushDelivery, PushDelivery};
pub use scheduler::{NotificationScheduler, DEFAULT_POLL_INTERVAL};
