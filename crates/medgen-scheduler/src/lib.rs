//! medgen-scheduler - one-shot reminder scheduling
//!
//! This crate provides:
//! - Reminder payload and handle types
//! - A notification sink abstraction so the alert surface stays pluggable
//! - The reminder runner, which spawns a detached polling task per reminder
//!   and fires its notification when the target time-of-day arrives

pub mod notify;
pub mod reminder;
pub mod runner;

// Re-export main types for convenience
pub use notify::{ConsoleSink, Notification, NotificationSink};
pub use reminder::{ReminderHandle, ReminderPayload};
pub use runner::{ReminderScheduler, SchedulerConfig};
