//! Agent classification
//!
//! Picks the specialized agent for a user message. Heuristics run first
//! (fast, free); optional LLM classification refines the choice, falling
//! back to the heuristic when the model's answer is unusable.

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::agents::{AgentKind, AgentRegistry};
use crate::ollama::{ChatMessage, OllamaClient};

/// Configuration for the classifier
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Whether to use LLM-based classification (vs heuristic only)
    pub use_llm: bool,
    /// Whether the classifier is enabled at all
    pub enabled: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            use_llm: true,
            enabled: true,
        }
    }
}

/// Classify a user message to the agent that should answer it.
pub async fn classify(
    message: &str,
    ollama: Option<&OllamaClient>,
    registry: &AgentRegistry,
    config: &ClassifierConfig,
) -> Result<AgentKind> {
    if !config.enabled {
        return Ok(AgentKind::Medvisor);
    }

    let heuristic = classify_heuristic(message);

    if config.use_llm
        && let Some(ollama) = ollama
    {
        match classify_with_llm(ollama, registry, message).await {
            Ok(kind) => {
                debug!("LLM classified message as {}", kind);
                return Ok(kind);
            }
            Err(e) => {
                warn!("LLM classification failed, using heuristic: {}", e);
            }
        }
    }

    debug!("Heuristic classified message as {}", heuristic);
    Ok(heuristic)
}

/// Heuristic-based classification (fast, no API call)
fn classify_heuristic(message: &str) -> AgentKind {
    let lower = message.to_lowercase();

    let reminder_signals = ["remind", "reminder", "alarm", "wake me", "don't let me forget"];
    if reminder_signals.iter().any(|s| lower.contains(s)) {
        return AgentKind::Reminder;
    }

    let product_signals = [
        "buy",
        "purchase",
        "order",
        "price",
        "product",
        "recommend a",
        "suggest a",
        "amazon",
        "where can i get",
    ];
    if product_signals.iter().any(|s| lower.contains(s)) {
        return AgentKind::Product;
    }

    // Health questions and everything else go to the medical advisor
    AgentKind::Medvisor
}

/// LLM-based classification using a dedicated classifier prompt
async fn classify_with_llm(
    ollama: &OllamaClient,
    registry: &AgentRegistry,
    message: &str,
) -> Result<AgentKind> {
    let response = ollama
        .chat(
            &[ChatMessage::user(message)],
            &classifier_prompt(registry),
            0.3,
        )
        .await
        .context("Failed to classify message")?;

    Ok(AgentKind::from_classifier_label(&response).unwrap_or_else(|| {
        debug!("Unrecognized classifier label {:?}, using default", response);
        AgentKind::Medvisor
    }))
}

/// Build the classifier system prompt from the registered profiles
fn classifier_prompt(registry: &AgentRegistry) -> String {
    let mut prompt = String::from(
        "You are a classifier. Determine the best agent for the user's message:\n",
    );
    for (i, profile) in registry.list().iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {} - {}\n",
            i + 1,
            profile.name,
            profile.description
        ));
    }
    prompt.push_str(
        "For any other topic return 'Medvisor' as the default.\n\
         Analyze both the topic and the intent of the message.\n\
         Return only the agent name.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_reminder() {
        assert_eq!(
            classify_heuristic("remind me to take my tablet at 8 PM"),
            AgentKind::Reminder
        );
        assert_eq!(
            classify_heuristic("set an alarm for my medicine"),
            AgentKind::Reminder
        );
    }

    #[test]
    fn test_heuristic_product() {
        assert_eq!(
            classify_heuristic("where can I get a good vitamin C supplement?"),
            AgentKind::Product
        );
        assert_eq!(
            classify_heuristic("what's the price of paracetamol on amazon"),
            AgentKind::Product
        );
    }

    #[test]
    fn test_heuristic_defaults_to_medvisor() {
        assert_eq!(
            classify_heuristic("I have a sore throat and a mild fever"),
            AgentKind::Medvisor
        );
        assert_eq!(classify_heuristic("hello"), AgentKind::Medvisor);
    }

    #[test]
    fn test_classifier_prompt_lists_all_agents() {
        let prompt = classifier_prompt(&AgentRegistry::default());
        assert!(prompt.contains("1. Medvisor"));
        assert!(prompt.contains("2. Product agent"));
        assert!(prompt.contains("3. Reminder agent"));
        assert!(prompt.contains("Return only the agent name"));
    }

    #[tokio::test]
    async fn test_classify_disabled_returns_default() {
        let config = ClassifierConfig {
            enabled: false,
            ..Default::default()
        };
        let kind = classify("remind me at 8", None, &AgentRegistry::default(), &config)
            .await
            .unwrap();
        assert_eq!(kind, AgentKind::Medvisor);
    }

    #[tokio::test]
    async fn test_classify_without_client_falls_back_to_heuristic() {
        let config = ClassifierConfig::default();
        let kind = classify(
            "remind me to take my pill at 9 PM",
            None,
            &AgentRegistry::default(),
            &config,
        )
        .await
        .unwrap();
        assert_eq!(kind, AgentKind::Reminder);
    }
}
