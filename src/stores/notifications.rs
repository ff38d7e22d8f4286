use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use super::observable::Observable;

pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_ERROR_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub message: String,
    /// Milliseconds until removal; 0 keeps it until removed explicitly.
    pub timeout: u64,
}

/// Transient user-facing messages, newest first.
///
/// Each notification expires on its own timer task; there is no shared
/// sweeper, so overlapping notifications expire independently.
#[derive(Clone)]
pub struct NotificationQueue {
    items: Observable<Vec<Notification>>,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self {
            items: Observable::new(Vec::new()),
        }
    }

    pub fn global() -> Arc<NotificationQueue> {
        static GLOBAL: OnceLock<Arc<NotificationQueue>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(NotificationQueue::new())).clone()
    }

    /// Push a notification and schedule its removal. Returns its id.
    pub fn add(&self, kind: NotificationType, message: impl Into<String>, timeout_ms: u64) -> String {
        let id = Uuid::new_v4().to_string();
        let notification = Notification {
            id: id.clone(),
            kind,
            message: message.into(),
            timeout: timeout_ms,
        };

        self.items.update(|all| all.insert(0, notification));

        if timeout_ms > 0 {
            self.schedule_removal(id.clone(), timeout_ms);
        }
        id
    }

    fn schedule_removal(&self, id: String, timeout_ms: u64) {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let queue = self.clone();
                handle.spawn(async move {
                    tokio::time::sleep_until(deadline).await;
                    queue.remove(&id);
                });
            }
            Err(_) => {
                log::warn!("No async runtime; notification {} will not expire", id);
            }
        }
    }

    /// Remove a notification. Unknown ids are ignored and publish nothing.
    pub fn remove(&self, id: &str) {
        self.items.update_if(|all| {
            let before = all.len();
            all.retain(|n| n.id != id);
            all.len() != before
        });
    }

    /// `timeout_ms` of `None` uses [`DEFAULT_TIMEOUT_MS`].
    pub fn info(&self, message: impl Into<String>, timeout_ms: Option<u64>) -> String {
        self.add(
            NotificationType::Info,
            message,
            timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        )
    }

    pub fn success(&self, message: impl Into<String>, timeout_ms: Option<u64>) -> String {
        self.add(
            NotificationType::Success,
            message,
            timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        )
    }

    pub fn warning(&self, message: impl Into<String>, timeout_ms: Option<u64>) -> String {
        self.add(
            NotificationType::Warning,
            message,
            timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        )
    }

    /// Errors stay longer: `None` uses [`DEFAULT_ERROR_TIMEOUT_MS`].
    pub fn error(&self, message: impl Into<String>, timeout_ms: Option<u64>) -> String {
        self.add(
            NotificationType::Error,
            message,
            timeout_ms.unwrap_or(DEFAULT_ERROR_TIMEOUT_MS),
        )
    }

    pub fn items(&self) -> Vec<Notification> {
        self.items.get()
    }

    pub fn len(&self) -> usize {
        self.items.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<Vec<Notification>> {
        self.items.subscribe()
    }
}
