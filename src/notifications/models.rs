use serde::{Deserialize, Serialize};

/// One scheduled notification inside the shared queue document.
///
/// Jobs are never removed; completion is marked in place through `sent`
/// and `sentAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationJob {
    pub id: String,
    /// Scheduled delivery time, RFC3339.
    pub when: String,
    #[serde(default)]
    pub targets: Vec<String>,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sent: bool,
    #[serde(rename = "sentAt", skip_serializing_if = "Option::is_none", default)]
    pub sent_at: Option<String>,
}

/// `db/admin/notifications.json` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationQueueDoc {
    #[serde(default)]
    pub queue: Vec<NotificationJob>,
}

/// What gets pushed to a subscriber.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub url: String,
}

impl PushPayload {
    pub fn from_job(job: &NotificationJob) -> Self {
        Self {
            title: job.title.clone(),
            body: job.body.clone(),
            icon: job.icon.clone(),
            url: job.url.clone().unwrap_or_else(|| "/".to_string()),
        }
    }
}
