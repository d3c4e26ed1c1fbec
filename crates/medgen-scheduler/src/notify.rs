//! Notification sink abstraction
//!
//! The runner delivers reminders through a sink trait so the alert surface
//! (terminal, OS notification center, test harness) stays pluggable.
//! Delivery is fire-and-forget: no confirmation flows back to the runner,
//! and failures are only logged.

use async_trait::async_trait;
use tracing::info;

/// An alert shown to the user when a reminder fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Whether the alert sound should loop until dismissed
    pub loop_sound: bool,
}

/// Where fired reminders are delivered
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: Notification);
}

/// Sink that renders an alert banner on the terminal. The looping alarm is
/// approximated with the terminal bell.
pub struct ConsoleSink;

#[async_trait]
impl NotificationSink for ConsoleSink {
    async fn deliver(&self, notification: Notification) {
        let bell = if notification.loop_sound { "\x07\x07\x07" } else { "" };
        println!(
            "\n{}⏰ Reminder: {}\n   {}",
            bell, notification.title, notification.body
        );
        info!("Delivered reminder notification '{}'", notification.title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_equality() {
        let a = Notification {
            title: "Take aspirin".into(),
            body: "morning dose".into(),
            loop_sound: true,
        };
        assert_eq!(a, a.clone());
    }

    #[tokio::test]
    async fn test_console_sink_delivers_without_panic() {
        let sink = ConsoleSink;
        sink.deliver(Notification {
            title: "t".into(),
            body: "b".into(),
            loop_sound: false,
        })
        .await;
    }
}
