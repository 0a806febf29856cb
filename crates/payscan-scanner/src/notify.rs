//! # Notification Sink
//!
//! Two-severity, self-expiring user messages, decoupled from rendering.
//!
//! ## Sinks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    trait NotificationSink                               │
//! │                notify(severity, message)  (non-blocking)                │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   NoOpSink      │  │  TracingSink    │  │  NotificationCenter     │ │
//! │  │   (tests)       │  │  info!/warn!    │  │  ordered list + expiry  │ │
//! │  │                 │  │                 │  │  broadcast to the host  │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Each notification expires on its own timer (default 5 s).             │
//! │  No coalescing, no cap on visible notifications.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use payscan_core::{Notification, Severity};

use crate::config::ScannerConfig;

// =============================================================================
// Sink Trait
// =============================================================================

/// Receives user-facing messages. Must return quickly.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSink;

impl NotificationSink for NoOpSink {
    fn notify(&self, _severity: Severity, _message: &str) {}
}

/// Logs notifications instead of rendering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Success => info!(%severity, "{}", message),
            Severity::Error => warn!(%severity, "{}", message),
        }
    }
}

// =============================================================================
// Notification Center
// =============================================================================

/// Change feed for hosts that render notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A notification became visible.
    Shown(Notification),
    /// The notification with this id expired.
    Expired(String),
}

struct Entry {
    notification: Notification,
    deadline: Instant,
}

/// In-memory notification list with per-item expiry.
///
/// Expiry is driven by a timer task per notification when a Tokio runtime is
/// available; [`NotificationCenter::visible`] also prunes by deadline, so the
/// list is correct without one.
#[derive(Clone)]
pub struct NotificationCenter {
    entries: Arc<Mutex<Vec<Entry>>>,
    events: broadcast::Sender<NotificationEvent>,
    lifetime: Duration,
}

impl NotificationCenter {
    pub fn new(lifetime: Duration) -> Self {
        let (events, _) = broadcast::channel(64);
        NotificationCenter {
            entries: Arc::new(Mutex::new(Vec::new())),
            events,
            lifetime,
        }
    }

    /// Center using `[notifications] lifetime_secs`.
    pub fn from_config(config: &ScannerConfig) -> Self {
        NotificationCenter::new(config.notification_lifetime())
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Subscribes to show/expire events.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }

    /// Notifications still visible, in the order they were raised.
    pub fn visible(&self) -> Vec<Notification> {
        let now = Instant::now();
        let mut entries = self.lock();
        entries.retain(|e| e.deadline > now);
        entries.iter().map(|e| e.notification.clone()).collect()
    }

    /// Drops every visible notification.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn schedule_expiry(&self, id: String) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let entries = Arc::clone(&self.entries);
        let events = self.events.clone();
        let lifetime = self.lifetime;

        handle.spawn(async move {
            tokio::time::sleep(lifetime).await;

            let removed = {
                let mut entries = entries.lock().unwrap_or_else(|p| p.into_inner());
                let before = entries.len();
                entries.retain(|e| e.notification.id != id);
                entries.len() != before
            };

            if removed {
                debug!(notification_id = %id, "Notification expired");
                let _ = events.send(NotificationEvent::Expired(id));
            }
        });
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        NotificationCenter::new(Duration::from_secs(payscan_core::NOTIFICATION_LIFETIME_SECS))
    }
}

impl NotificationSink for NotificationCenter {
    fn notify(&self, severity: Severity, message: &str) {
        let lifetime_ms = u64::try_from(self.lifetime.as_millis()).unwrap_or(u64::MAX);
        let notification = Notification::new(severity, message, lifetime_ms);
        let id = notification.id.clone();

        self.lock().push(Entry {
            notification: notification.clone(),
            deadline: Instant::now() + self.lifetime,
        });

        // No subscribers is fine.
        let _ = self.events.send(NotificationEvent::Shown(notification));
        self.schedule_expiry(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_keeps_call_order() {
        let center = NotificationCenter::default();
        center.notify(Severity::Error, "first");
        center.notify(Severity::Success, "second");

        let visible = center.visible();
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].message, "first");
        assert_eq!(visible[0].severity, Severity::Error);
        assert_eq!(visible[1].message, "second");
        assert_eq!(visible[1].lifetime_ms, 5_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifetime_from_config() {
        let mut config = ScannerConfig::default();
        config.notifications.lifetime_secs = 2;

        let center = NotificationCenter::from_config(&config);
        assert_eq!(center.lifetime(), Duration::from_secs(2));

        center.notify(Severity::Error, "short");
        assert_eq!(center.visible()[0].lifetime_ms, 2_000);

        tokio::time::advance(Duration::from_millis(2_100)).await;
        assert!(center.visible().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_notification_expires_independently() {
        let center = NotificationCenter::new(Duration::from_secs(5));
        center.notify(Severity::Success, "early");

        tokio::time::advance(Duration::from_secs(3)).await;
        center.notify(Severity::Error, "late");
        assert_eq!(center.visible().len(), 2);

        tokio::time::advance(Duration::from_secs(2)).await;
        let visible = center.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].message, "late");

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(center.visible().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_show_and_expire() {
        let center = NotificationCenter::new(Duration::from_secs(5));
        let mut rx = center.subscribe();

        center.notify(Severity::Success, "QR code scanned successfully!");

        let shown = match rx.recv().await.unwrap() {
            NotificationEvent::Shown(n) => n,
            other => panic!("unexpected event: {:?}", other),
        };
        assert_eq!(shown.message, "QR code scanned successfully!");

        // Paused clock auto-advances to the expiry timer.
        assert_eq!(rx.recv().await.unwrap(), NotificationEvent::Expired(shown.id));
        assert!(center.visible().is_empty());
    }

    #[test]
    fn test_noop_and_tracing_sinks_accept_messages() {
        NoOpSink.notify(Severity::Error, "ignored");
        TracingSink.notify(Severity::Success, "logged");
    }
}
