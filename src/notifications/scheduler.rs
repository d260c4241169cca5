use super::models::{NotificationJob, NotificationQueueDoc, PushPayload};
use super::push::PushDelivery;
use crate::documents::{keys, DocumentStore};
use crate::storage::{get_json, put_json, BlobStore, StorageError};
use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Polls the shared queue document and delivers due notifications.
///
/// Ticks run strictly one after another inside `run`, so a slow tick delays
/// the next one instead of overlapping it. A tick that fails is logged and
/// retried naturally on the next interval. A crash after delivery but
/// before the queue write re-delivers the job next tick; duplicates are
/// accepted, silent loss is not.
pub struct NotificationScheduler {
    blobs: Arc<dyn BlobStore>,
    documents: Arc<DocumentStore>,
    push: Arc<dyn PushDelivery>,
    poll_interval: Duration,
}

impl NotificationScheduler {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        documents: Arc<DocumentStore>,
        push: Arc<dyn PushDelivery>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            blobs,
            documents,
            push,
            poll_interval,
        }
    }

    /// Appends a job to the queue and returns its id.
    pub async fn schedule(
        &self,
        when: &str,
        targets: Vec<String>,
        title: &str,
        body: &str,
        icon: Option<String>,
        url: Option<String>,
    ) -> Result<String> {
        let mut doc = self.load_queue().await?;
        let id = base36_millis(Utc::now().timestamp_millis());
        doc.queue.push(NotificationJob {
            id: id.clone(),
            when: when.to_string(),
            targets,
            title: title.to_string(),
            body: body.to_string(),
            icon,
            url,
            sent: false,
            sent_at: None,
        });
        put_json(self.blobs.as_ref(), keys::NOTIFICATION_QUEUE, &doc).await?;
        Ok(id)
    }

    /// Immediate fan-out to a list of users, bypassing the queue.
    pub async fn broadcast(&self, targets: &[String], payload: &PushPayload) {
        for uid in targets {
            self.deliver_to(uid, payload).await;
        }
    }

    /// Cooperative polling loop. Returns when `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            "notification scheduler started, polling every {:?}",
            self.poll_interval
        );
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("notification scheduler stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.run_tick().await {
                        warn!("notification tick failed, retrying next interval: {err:#}");
                    }
                }
            }
        }
    }

    /// One scheduler pass, exposed for deterministic tests.
    ///
    /// Due jobs are delivered to every target (individual failures do not
    /// block the job), marked sent, and the whole document is persisted
    /// once at the end. A failed write leaves the jobs unsent so the next
    /// tick retries them.
    pub async fn run_tick(&self) -> Result<()> {
        let mut doc = self.load_queue().await?;
        let now = Utc::now();
        let mut delivered = 0usize;
        for job in doc.queue.iter_mut() {
            if job.sent || !is_due(&job.when, now) {
                continue;
            }
            let payload = PushPayload::from_job(job);
            for uid in &job.targets {
                self.deliver_to(uid, &payload).await;
            }
            job.sent = true;
            job.sent_at = Some(now.to_rfc3339_opts(SecondsFormat::Millis, true));
            delivered += 1;
        }
        if delivered > 0 {
            put_json(self.blobs.as_ref(), keys::NOTIFICATION_QUEUE, &doc).await?;
            info!("delivered {delivered} scheduled notification(s)");
        }
        Ok(())
    }

    async fn load_queue(&self) -> Result<NotificationQueueDoc> {
        match get_json(self.blobs.as_ref(), keys::NOTIFICATION_QUEUE).await {
            Ok(doc) => Ok(doc),
            Err(StorageError::NotFound(_)) => Ok(NotificationQueueDoc::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Best-effort delivery to one user. Missing subscriptions and
    /// transport failures are logged and swallowed.
    async fn deliver_to(&self, uid: &str, payload: &PushPayload) {
        match self.documents.get_push_subscription(uid).await {
            Ok(Some(subscription)) => {
                if let Err(err) = self.push.send(&subscription, payload).await {
                    warn!("push delivery to user {uid} failed: {err:#}");
                }
            }
            Ok(None) => debug!("user {uid} has no push subscription, skipping"),
            Err(err) => warn!("could not load push subscription for user {uid}: {err}"),
        }
    }
}

fn is_due(when: &str, now: DateTime<Utc>) -> bool {
    match DateTime::parse_from_rfc3339(when) {
        Ok(t) => t <= now,
        Err(err) => {
            // An unparseable timestamp never becomes due; flag it rather
            // than deliver at a surprise moment.
            warn!("unparseable notification schedule \"{when}\": {err}");
            false
        }
    }
}

fn base36_millis(mut millis: i64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if millis <= 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while millis > 0 {
        out.push(DIGITS[(millis % 36) as usize]);
        millis /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base36_id_encoding() {
        assert_eq!(base36_millis(0), "0");
        assert_eq!(base36_millis(35), "z");
        assert_eq!(base36_millis(36), "10");
    }

    #[test]
    fn test_is_due_parses_rfc3339() {
        let now = Utc::now();
        assert!(is_due("2020-01-01T00:00:00Z", now));
        assert!(!is_due("2999-01-01T00:00:00Z", now));
        assert!(!is_due("not-a-date", now));
    }
}
