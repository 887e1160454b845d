//! Single-slot, auto-dismissing feedback messages.
//!
//! A new message replaces the current one and restarts the hide timer.
//! Each message carries a version; a timer only hides the message it was
//! started for, so a stale timer never clears a newer message.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// What the notification slot currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    pub visible: bool,
    pub message: String,
    pub success: bool,
}

/// Shared notification controller.
///
/// Cheap to clone; all clones drive the same slot.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    ttl: Duration,
    slot: Mutex<Slot>,
}

#[derive(Default)]
struct Slot {
    notification: Notification,
    version: u64,
    hide_task: Option<JoinHandle<()>>,
}

impl Notifier {
    /// Controller whose messages hide after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(NotifierInner {
                ttl,
                slot: Mutex::new(Slot::default()),
            }),
        }
    }

    /// Show `message` and schedule it to hide.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn show(&self, message: impl Into<String>, success: bool) {
        let message = message.into();
        tracing::debug!(%message, success, "Showing notification");

        let mut slot = self.lock();
        slot.version += 1;
        slot.notification = Notification {
            visible: true,
            message,
            success,
        };

        if let Some(previous) = slot.hide_task.take() {
            previous.abort();
        }

        let version = slot.version;
        let notifier = self.clone();
        slot.hide_task = Some(tokio::spawn(async move {
            tokio::time::sleep(notifier.inner.ttl).await;
            notifier.hide_if_current(version);
        }));
    }

    /// Show a success message.
    pub fn success(&self, message: impl Into<String>) {
        self.show(message, true);
    }

    /// Show a failure message.
    pub fn failure(&self, message: impl Into<String>) {
        self.show(message, false);
    }

    /// Hide the current message now.
    pub fn dismiss(&self) {
        let mut slot = self.lock();
        slot.version += 1;
        slot.notification.visible = false;
        if let Some(task) = slot.hide_task.take() {
            task.abort();
        }
    }

    /// Snapshot of the slot.
    #[must_use]
    pub fn current(&self) -> Notification {
        self.lock().notification.clone()
    }

    fn hide_if_current(&self, version: u64) {
        let mut slot = self.lock();
        if slot.version == version {
            slot.notification.visible = false;
            slot.hide_task = None;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_millis(1500);

    #[tokio::test(start_paused = true)]
    async fn test_hides_after_ttl() {
        let notifier = Notifier::new(TTL);
        notifier.success("Added to cart!");

        let shown = notifier.current();
        assert!(shown.visible);
        assert!(shown.success);
        assert_eq!(shown.message, "Added to cart!");

        tokio::time::sleep(TTL + Duration::from_millis(1)).await;
        assert!(!notifier.current().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_message_survives_older_timer() {
        let notifier = Notifier::new(TTL);
        notifier.success("Added to cart!");

        tokio::time::sleep(Duration::from_millis(1000)).await;
        notifier.failure("Stok yok");

        // First timer would have fired here.
        tokio::time::sleep(Duration::from_millis(600)).await;
        let shown = notifier.current();
        assert!(shown.visible);
        assert!(!shown.success);
        assert_eq!(shown.message, "Stok yok");

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(!notifier.current().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss() {
        let notifier = Notifier::new(TTL);
        notifier.failure("Please sign in.");
        notifier.dismiss();
        assert!(!notifier.current().visible);
        assert_eq!(notifier.current().message, "Please sign in.");
    }

    #[test]
    fn test_starts_hidden() {
        assert_eq!(Notifier::new(TTL).current(), Notification::default());
    }
}
