//! Notification sink that prints to the terminal.
//!
//! Every message is also kept in a [`NotificationCenter`] for its configured
//! lifetime, so `--verbose` runs log when each one expires.

use payscan_core::{Notification, Severity};
use payscan_scanner::{NotificationCenter, NotificationSink, ScannerConfig};
use tracing::debug;

/// Prints successes to stdout and errors to stderr.
#[derive(Clone)]
pub struct ConsoleSink {
    center: NotificationCenter,
}

impl ConsoleSink {
    pub fn new(center: NotificationCenter) -> Self {
        ConsoleSink { center }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        ConsoleSink::new(NotificationCenter::from_config(config))
    }

    /// Messages that have not expired yet.
    pub fn visible(&self) -> Vec<Notification> {
        self.center.visible()
    }
}

impl NotificationSink for ConsoleSink {
    fn notify(&self, severity: Severity, message: &str) {
        debug!(%severity, lifetime = ?self.center.lifetime(), "Notification raised");
        match severity {
            Severity::Success => println!("[ok] {}", message),
            Severity::Error => eprintln!("[error] {}", message),
        }
        self.center.notify(severity, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_messages_expire_after_configured_lifetime() {
        let mut config = ScannerConfig::default();
        config.notifications.lifetime_secs = 1;

        let sink = ConsoleSink::from_config(&config);
        sink.notify(Severity::Error, "No QR code found");
        assert_eq!(sink.visible().len(), 1);
        assert_eq!(sink.visible()[0].lifetime_ms, 1_000);

        tokio::time::advance(Duration::from_millis(1_100)).await;
        assert!(sink.visible().is_empty());
    }
}
