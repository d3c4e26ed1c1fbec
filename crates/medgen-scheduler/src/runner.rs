//! Tokio task runner for reminders
//!
//! This module manages the lifecycle of reminder tasks, spawning one
//! detached tokio task per scheduled reminder. Each task polls the wall
//! clock on a fixed interval, fires its notification when the local
//! time-of-day equals the target "HH:MM", and terminates. Firing is
//! exactly-once; the only other exits are explicit cancellation and
//! scheduler shutdown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::notify::{Notification, NotificationSink};
use crate::reminder::{ReminderHandle, ReminderPayload};

/// Configuration for the reminder runner
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often each reminder task compares the clock to its target.
    /// Acceptable firing slack is up to one interval past the target minute.
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
        }
    }
}

/// Manages the lifecycle of reminder tasks
pub struct ReminderScheduler {
    /// Configuration
    config: SchedulerConfig,

    /// Sink fired reminders are delivered through
    sink: Arc<dyn NotificationSink>,

    /// Active reminder tasks (reminder id -> CancellationToken)
    active_tasks: Arc<RwLock<HashMap<String, CancellationToken>>>,

    /// Global shutdown token
    shutdown_token: CancellationToken,
}

impl ReminderScheduler {
    /// Create a new reminder scheduler with the default 15s polling interval
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_config(sink, SchedulerConfig::default())
    }

    /// Create a new reminder scheduler with custom configuration
    pub fn with_config(sink: Arc<dyn NotificationSink>, config: SchedulerConfig) -> Self {
        Self {
            config,
            sink,
            active_tasks: Arc::new(RwLock::new(HashMap::new())),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Schedule a reminder. Returns immediately with a cancellable handle;
    /// the firing task runs detached and is never awaited by the caller.
    pub async fn schedule(&self, payload: ReminderPayload) -> ReminderHandle {
        let id = uuid::Uuid::new_v4().to_string();
        let token = CancellationToken::new();

        self.active_tasks
            .write()
            .await
            .insert(id.clone(), token.clone());

        info!("Scheduling reminder {} for {}", id, payload.fire_at);

        let handle = ReminderHandle::new(id.clone(), payload.clone(), token.clone());

        let sink = self.sink.clone();
        let active_tasks = self.active_tasks.clone();
        let global_shutdown = self.shutdown_token.clone();
        let poll_interval = self.config.poll_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("Reminder {} cancelled", id);
                        break;
                    }
                    _ = global_shutdown.cancelled() => {
                        info!("Reminder {} stopped due to scheduler shutdown", id);
                        break;
                    }
                    _ = interval.tick() => {
                        let now = Local::now().format("%H:%M").to_string();
                        if now == payload.fire_at {
                            sink.deliver(Notification {
                                title: payload.message.clone(),
                                body: payload.purpose.clone(),
                                loop_sound: true,
                            })
                            .await;
                            info!("Reminder {} fired at {}", id, now);
                            break;
                        }
                        debug!("Reminder {} waiting ({} != {})", id, now, payload.fire_at);
                    }
                }
            }

            // Clean up - idempotent, entry may already be removed by cancel()
            let mut tasks = active_tasks.write().await;
            if tasks.remove(&id).is_some() {
                debug!("Reminder {} cleaned up from active tasks", id);
            }
        });

        handle
    }

    /// Cancel a specific reminder
    pub async fn cancel(&self, id: &str) -> bool {
        let mut tasks = self.active_tasks.write().await;

        if let Some(token) = tasks.remove(id) {
            info!("Cancelling reminder: {}", id);
            token.cancel();
            true
        } else {
            debug!("Attempted to cancel unknown reminder: {}", id);
            false
        }
    }

    /// Cancel all pending reminders
    pub async fn stop_all(&self) {
        info!("Stopping all reminders");

        self.shutdown_token.cancel();

        let mut tasks = self.active_tasks.write().await;
        for (id, token) in tasks.drain() {
            debug!("Cancelling reminder: {}", id);
            token.cancel();
        }
    }

    /// Get the number of pending reminders
    pub async fn active_count(&self) -> usize {
        self.active_tasks.read().await.len()
    }

    /// Check if a reminder is still pending
    pub async fn is_active(&self, id: &str) -> bool {
        self.active_tasks.read().await.contains_key(id)
    }
}
