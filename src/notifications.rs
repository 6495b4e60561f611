use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::trace;

/// Toast id shared by the loading, success and failure messages of one upload,
/// so each replaces the previous on screen
pub const UPLOAD_TOAST_ID: &str = "upload";

type SubscriptionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
    Loading,
}

/// A transient user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// Messages with the same id replace one another
    pub id: Option<String>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Notification {
            level,
            message: message.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone)]
enum SubscriptionFilter {
    All,
    Toast { id: String },
}

impl SubscriptionFilter {
    fn matches(&self, notification: &Notification) -> bool {
        match self {
            SubscriptionFilter::All => true,
            SubscriptionFilter::Toast { id } => notification.id.as_deref() == Some(id.as_str()),
        }
    }
}

struct Subscription {
    filter: SubscriptionFilter,
    tx: tokio_mpsc::UnboundedSender<Notification>,
}

/// Fan-out of notifications to any number of listeners.
///
/// Cloning shares the subscriber table. A subscription goes away once its
/// receiver is dropped.
#[derive(Clone)]
pub struct Notifier {
    subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Notifier {
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Receive every notification
    pub fn subscribe(&self) -> tokio_mpsc::UnboundedReceiver<Notification> {
        self.add_subscription(SubscriptionFilter::All)
    }

    /// Receive only the messages sharing toast `id`
    pub fn subscribe_toast(&self, id: impl Into<String>) -> tokio_mpsc::UnboundedReceiver<Notification> {
        self.add_subscription(SubscriptionFilter::Toast { id: id.into() })
    }

    pub fn notify(&self, notification: Notification) {
        trace!("Notification {:?}: {}", notification.level, notification.message);

        let mut subs = self.lock();
        let mut to_remove = Vec::new();

        for (id, subscription) in subs.iter() {
            if subscription.filter.matches(&notification)
                && subscription.tx.send(notification.clone()).is_err()
            {
                to_remove.push(*id);
            }
        }

        for id in to_remove {
            subs.remove(&id);
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(Notification::new(NotificationLevel::Info, message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.notify(Notification::new(NotificationLevel::Warning, message));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(Notification::new(NotificationLevel::Success, message));
    }

    /// Post under a toast id, replacing the previous message with that id
    pub fn toast(&self, id: &str, level: NotificationLevel, message: impl Into<String>) {
        self.notify(Notification::new(level, message).with_id(id));
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn add_subscription(&self, filter: SubscriptionFilter) -> tokio_mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        self.lock().insert(id, Subscription { filter, tx });
        rx
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SubscriptionId, Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_filter() {
        let notifier = Notifier::new();
        let mut all = notifier.subscribe();
        let mut uploads = notifier.subscribe_toast(UPLOAD_TOAST_ID);

        notifier.warning("too big");
        notifier.toast(UPLOAD_TOAST_ID, NotificationLevel::Loading, "Uploading files…");

        assert_eq!(all.try_recv().unwrap().level, NotificationLevel::Warning);
        assert_eq!(all.try_recv().unwrap().level, NotificationLevel::Loading);

        let only = uploads.try_recv().unwrap();
        assert_eq!(only.id.as_deref(), Some(UPLOAD_TOAST_ID));
        assert!(uploads.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_is_unsubscribed() {
        let notifier = Notifier::new();
        let rx = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 1);

        drop(rx);
        notifier.info("anyone?");

        assert_eq!(notifier.subscriber_count(), 0);
    }
}
