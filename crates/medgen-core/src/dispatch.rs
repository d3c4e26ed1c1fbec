//! Response-driven side-effect dispatch
//!
//! After the router returns a tagged reply, the dispatcher decides which
//! post-processing applies (reminder scheduling, product lookup), runs it,
//! and reports outcomes for the caller to render. Trigger conditions are
//! predicate functions over the routed reply, so callers can swap the
//! defaults without touching the dispatch flow.

use std::sync::Arc;

use tracing::{info, warn};

use medgen_scheduler::{ReminderHandle, ReminderScheduler};

use crate::agents::AgentKind;
use crate::lookup::{LookupError, ProductLookupClient, ProductResult};
use crate::orchestrator::RoutedReply;
use crate::parser::{self, JSON_FENCE, ParseFailure};

/// Predicate over a routed reply
pub type Trigger = Box<dyn Fn(&RoutedReply) -> bool + Send + Sync>;

/// Which post-processing steps apply to a routed reply
pub struct DispatchPolicy {
    reminder_trigger: Trigger,
    product_trigger: Trigger,
}

impl DispatchPolicy {
    /// Replace the reminder trigger predicate
    pub fn with_reminder_trigger(mut self, trigger: Trigger) -> Self {
        self.reminder_trigger = trigger;
        self
    }

    /// Replace the product trigger predicate
    pub fn with_product_trigger(mut self, trigger: Trigger) -> Self {
        self.product_trigger = trigger;
        self
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            // A reminder is only parseable when the reminder agent answered
            // and actually emitted a fenced block
            reminder_trigger: Box::new(|reply| {
                reply.agent == AgentKind::Reminder && reply.text.contains(JSON_FENCE)
            }),
            // Both advice agents can mention products worth looking up
            product_trigger: Box::new(|reply| {
                matches!(reply.agent, AgentKind::Medvisor | AgentKind::Product)
            }),
        }
    }
}

/// What the dispatcher did with one routed reply
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A reminder was parsed and scheduled
    ReminderSet(ReminderHandle),
    /// The reply looked like a reminder but could not be parsed
    ReminderFailed(ParseFailure),
    /// A product candidate was looked up (possibly with zero hits)
    ProductResults {
        candidate: String,
        results: Vec<ProductResult>,
    },
    /// Lookup for one candidate failed; other candidates still proceed
    ProductLookupFailed {
        candidate: String,
        error: LookupError,
    },
}

/// Runs post-processing side effects for routed replies
pub struct Dispatcher {
    policy: DispatchPolicy,
    scheduler: Arc<ReminderScheduler>,
    lookup: ProductLookupClient,
}

impl Dispatcher {
    pub fn new(scheduler: Arc<ReminderScheduler>, lookup: ProductLookupClient) -> Self {
        Self {
            policy: DispatchPolicy::default(),
            scheduler,
            lookup,
        }
    }

    /// Set the dispatch policy
    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Inspect a routed reply and run whichever side effects its triggers
    /// select. Failures are reported as outcomes, never propagated — the
    /// conversation loop survives every parse and lookup error.
    pub async fn dispatch(&self, reply: &RoutedReply) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();

        if (self.policy.reminder_trigger)(reply) {
            match parser::parse_reminder(&reply.text) {
                Ok(payload) => {
                    info!("Scheduling reminder for {}", payload.fire_at);
                    let handle = self.scheduler.schedule(payload).await;
                    outcomes.push(DispatchOutcome::ReminderSet(handle));
                }
                Err(e) => {
                    warn!("Error setting reminder: {}", e);
                    outcomes.push(DispatchOutcome::ReminderFailed(e));
                }
            }
        }

        if (self.policy.product_trigger)(reply) {
            for candidate in parser::extract_product_candidates(&reply.text) {
                match self.lookup.search(&candidate).await {
                    Ok(results) => {
                        outcomes.push(DispatchOutcome::ProductResults { candidate, results });
                    }
                    Err(error) => {
                        warn!("Lookup for {:?} failed: {}", candidate, error);
                        outcomes.push(DispatchOutcome::ProductLookupFailed { candidate, error });
                    }
                }
            }
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use medgen_scheduler::{Notification, NotificationSink, SchedulerConfig};
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct NullSink;

    #[async_trait]
    impl NotificationSink for NullSink {
        async fn deliver(&self, _notification: Notification) {}
    }

    fn scheduler() -> Arc<ReminderScheduler> {
        Arc::new(ReminderScheduler::with_config(
            Arc::new(NullSink),
            SchedulerConfig {
                poll_interval: Duration::from_millis(50),
            },
        ))
    }

    fn reply(agent: AgentKind, text: &str) -> RoutedReply {
        RoutedReply {
            agent,
            agent_name: agent.to_string(),
            text: text.to_string(),
        }
    }

    async fn dispatcher_with_stub(server: &MockServer) -> Dispatcher {
        let lookup =
            ProductLookupClient::new("test-key".to_string()).with_base_url(server.uri());
        Dispatcher::new(scheduler(), lookup)
    }

    fn products_body() -> serde_json::Value {
        serde_json::json!({"data": {"products": [
            {"product_title": "Tylenol", "product_price": "$9.99",
             "product_url": "https://example.com/1", "sales_volume": "1K+"}
        ]}})
    }

    #[tokio::test]
    async fn test_reminder_reply_schedules_reminder() {
        let server = MockServer::start().await;
        let dispatcher = dispatcher_with_stub(&server).await;

        let routed = reply(
            AgentKind::Reminder,
            "```json\n{\"message\": \"Take aspirin\", \"purpose\": \"dose\", \"reminder_at\": \"8:30 PM\"}\n```",
        );
        let outcomes = dispatcher.dispatch(&routed).await;

        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            DispatchOutcome::ReminderSet(handle) => {
                assert_eq!(handle.payload.fire_at, "20:30");
                handle.cancel();
            }
            other => panic!("expected ReminderSet, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_reminder_reports_failure_without_aborting() {
        let server = MockServer::start().await;
        let dispatcher = dispatcher_with_stub(&server).await;

        let routed = reply(AgentKind::Reminder, "```json\nnot json\n```");
        let outcomes = dispatcher.dispatch(&routed).await;

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            outcomes[0],
            DispatchOutcome::ReminderFailed(ParseFailure::InvalidShape(_))
        ));
    }

    #[tokio::test]
    async fn test_reminder_reply_without_fence_triggers_nothing() {
        let server = MockServer::start().await;
        let dispatcher = dispatcher_with_stub(&server).await;

        let routed = reply(AgentKind::Reminder, "I could not parse a time from that.");
        assert!(dispatcher.dispatch(&routed).await.is_empty());
    }

    #[tokio::test]
    async fn test_product_lookup_failures_do_not_abort_other_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "Tylenol tablet"))
            .respond_with(ResponseTemplate::new(200).set_body_json(products_body()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "Benadryl syrup"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let dispatcher = dispatcher_with_stub(&server).await;
        let routed = reply(
            AgentKind::Medvisor,
            r#"Try "Tylenol tablet" or "Benadryl syrup" before bed."#,
        );
        let outcomes = dispatcher.dispatch(&routed).await;

        assert_eq!(outcomes.len(), 2);
        let ok = outcomes.iter().any(|o| matches!(
            o,
            DispatchOutcome::ProductResults { candidate, results }
                if candidate == "Tylenol tablet" && results.len() == 1
        ));
        let failed = outcomes.iter().any(|o| matches!(
            o,
            DispatchOutcome::ProductLookupFailed { candidate, .. }
                if candidate == "Benadryl syrup"
        ));
        assert!(ok, "expected a successful lookup outcome: {:?}", outcomes);
        assert!(failed, "expected a failed lookup outcome: {:?}", outcomes);
    }

    #[tokio::test]
    async fn test_medvisor_reply_without_candidates_dispatches_nothing() {
        let server = MockServer::start().await;
        let dispatcher = dispatcher_with_stub(&server).await;

        let routed = reply(AgentKind::Medvisor, "Rest and drink plenty of water.");
        assert!(dispatcher.dispatch(&routed).await.is_empty());
    }

    #[tokio::test]
    async fn test_custom_policy_overrides_default_triggers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(products_body()))
            .mount(&server)
            .await;

        // Product extraction on reminder replies too, reminders never
        let policy = DispatchPolicy::default()
            .with_reminder_trigger(Box::new(|_| false))
            .with_product_trigger(Box::new(|r| r.agent == AgentKind::Reminder));

        let dispatcher = dispatcher_with_stub(&server).await.with_policy(policy);
        let routed = reply(
            AgentKind::Reminder,
            r#"Buy "Tylenol tablet" first. ```json\n{}\n```"#,
        );
        let outcomes = dispatcher.dispatch(&routed).await;

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            outcomes[0],
            DispatchOutcome::ProductResults { .. }
        ));
    }
}
