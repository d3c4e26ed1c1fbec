//! Message routing
//!
//! The `Router` seam the dispatch loop depends on, plus the first-party
//! implementation that classifies each message and invokes the selected
//! agent profile against Ollama. The reply comes back tagged with the
//! answering agent, so downstream dispatch never has to re-parse which
//! agent spoke out of the text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::agents::{AgentKind, AgentRegistry};
use crate::classifier::{self, ClassifierConfig};
use crate::ollama::{ChatMessage, OllamaClient};

/// A routed agent reply, tagged with who answered
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedReply {
    pub agent: AgentKind,
    /// Display name of the answering agent
    pub agent_name: String,
    pub text: String,
}

/// Routes one message per turn to a specialized agent
#[async_trait]
pub trait Router: Send + Sync {
    /// Route a message and return the tagged reply. `on_chunk` is invoked
    /// with response text as it becomes available, for streaming display.
    async fn orchestrate(
        &self,
        session_id: &str,
        message: &str,
        on_chunk: Option<&(dyn Fn(&str) + Send + Sync)>,
    ) -> Result<RoutedReply>;
}

/// Router backed by the classifier and the Ollama client
pub struct AgentOrchestrator {
    ollama: OllamaClient,
    registry: AgentRegistry,
    classifier_config: ClassifierConfig,
    default_agent: AgentKind,
}

impl AgentOrchestrator {
    pub fn new(ollama: OllamaClient, registry: AgentRegistry) -> Self {
        Self {
            ollama,
            registry,
            classifier_config: ClassifierConfig::default(),
            default_agent: AgentKind::Medvisor,
        }
    }

    /// Set the classifier configuration
    pub fn with_classifier_config(mut self, config: ClassifierConfig) -> Self {
        self.classifier_config = config;
        self
    }

    /// Set the agent used when classification yields nothing
    pub fn with_default_agent(mut self, default_agent: AgentKind) -> Self {
        self.default_agent = default_agent;
        self
    }
}

#[async_trait]
impl Router for AgentOrchestrator {
    async fn orchestrate(
        &self,
        session_id: &str,
        message: &str,
        on_chunk: Option<&(dyn Fn(&str) + Send + Sync)>,
    ) -> Result<RoutedReply> {
        let kind = classifier::classify(
            message,
            Some(&self.ollama),
            &self.registry,
            &self.classifier_config,
        )
        .await
        .unwrap_or(self.default_agent);

        let profile = self
            .registry
            .get(kind)
            .with_context(|| format!("no profile registered for agent {}", kind))?;

        info!("Routing message on session {} to {}", session_id, profile.name);

        let text = self
            .ollama
            .chat(
                &[ChatMessage::user(message)],
                &profile.system_prompt,
                profile.temperature,
            )
            .await
            .with_context(|| format!("{} failed to answer", profile.name))?;

        debug!("{} replied with {} chars", profile.name, text.len());

        if let Some(on_chunk) = on_chunk {
            on_chunk(&text);
        }

        Ok(RoutedReply {
            agent: kind,
            agent_name: profile.name.clone(),
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": null
        })
    }

    fn heuristic_orchestrator(server_uri: String) -> AgentOrchestrator {
        let ollama = OllamaClient::new(server_uri, "gemma3:4b".to_string());
        AgentOrchestrator::new(ollama, AgentRegistry::default()).with_classifier_config(
            ClassifierConfig {
                use_llm: false,
                enabled: true,
            },
        )
    }

    #[tokio::test]
    async fn test_orchestrate_tags_reply_with_answering_agent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_body("```json\n{\"message\": \"m\"}\n```")),
            )
            .mount(&server)
            .await;

        let orchestrator = heuristic_orchestrator(server.uri());
        let reply = orchestrator
            .orchestrate("s-1", "remind me to take my pill at 8 PM", None)
            .await
            .unwrap();

        assert_eq!(reply.agent, AgentKind::Reminder);
        assert_eq!(reply.agent_name, "Reminder agent");
        assert!(reply.text.contains("```json"));
    }

    #[tokio::test]
    async fn test_orchestrate_invokes_chunk_callback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Rest well.")))
            .mount(&server)
            .await;

        let orchestrator = heuristic_orchestrator(server.uri());
        let streamed = Mutex::new(String::new());
        let collect = |chunk: &str| streamed.lock().unwrap().push_str(chunk);
        let on_chunk: &(dyn Fn(&str) + Send + Sync) = &collect;
        let reply = orchestrator
            .orchestrate("s-1", "I have a sore throat", Some(on_chunk))
            .await
            .unwrap();

        assert_eq!(reply.agent, AgentKind::Medvisor);
        assert_eq!(*streamed.lock().unwrap(), "Rest well.");
    }

    #[tokio::test]
    async fn test_orchestrate_surfaces_agent_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let orchestrator = heuristic_orchestrator(server.uri());
        let err = orchestrator
            .orchestrate("s-1", "I have a headache", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to answer"));
    }
}
