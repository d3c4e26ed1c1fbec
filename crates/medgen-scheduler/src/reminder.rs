//! Reminder types
//!
//! A reminder is a message/purpose pair plus a target time-of-day. Once
//! scheduled it is represented by a handle that can cancel the pending
//! firing task.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// A reminder waiting to be fired at a wall-clock time-of-day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderPayload {
    /// Notification title shown when the reminder fires
    pub message: String,

    /// Notification body (what the reminder is for)
    pub purpose: String,

    /// Target local time-of-day in zero-padded 24-hour "HH:MM" form
    pub fire_at: String,
}

/// Handle to a scheduled reminder task
#[derive(Debug, Clone)]
pub struct ReminderHandle {
    /// Unique identifier for this reminder
    pub id: String,

    /// The payload captured at scheduling time
    pub payload: ReminderPayload,

    token: CancellationToken,
}

impl ReminderHandle {
    pub(crate) fn new(id: String, payload: ReminderPayload, token: CancellationToken) -> Self {
        Self { id, payload, token }
    }

    /// Cancel the pending firing task. Idempotent; has no effect after the
    /// reminder has fired.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether this reminder has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Human-readable description of this reminder
    pub fn description(&self) -> String {
        format!("'{}' at {}", self.payload.message, self.payload.fire_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ReminderPayload {
        ReminderPayload {
            message: "Take aspirin".to_string(),
            purpose: "morning dose".to_string(),
            fire_at: "08:30".to_string(),
        }
    }

    #[test]
    fn test_payload_serialization_round_trip() {
        let p = payload();
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("08:30"));
        let back: ReminderPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_handle_cancel_is_idempotent() {
        let handle = ReminderHandle::new("r-1".into(), payload(), CancellationToken::new());
        assert!(!handle.is_cancelled());
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_handle_description() {
        let handle = ReminderHandle::new("r-1".into(), payload(), CancellationToken::new());
        assert!(handle.description().contains("Take aspirin"));
        assert!(handle.description().contains("08:30"));
    }
}
