//! Built-in agent profiles
//!
//! Each specialized agent is a name, a system prompt, and a sampling
//! temperature over the same Ollama model. The registry is the lookup
//! table the orchestrator routes against.

use serde::{Deserialize, Serialize};

/// The specialized agents available for routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Medical advisor: home remedies and immediate-relief advice
    Medvisor,
    /// Healthcare product suggestions backed by marketplace lookup
    Product,
    /// Emits a structured reminder payload for the scheduler
    Reminder,
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Medvisor => write!(f, "medvisor"),
            Self::Product => write!(f, "product"),
            Self::Reminder => write!(f, "reminder"),
        }
    }
}

impl AgentKind {
    /// Map a classifier's free-text label onto an agent kind. The label is
    /// matched leniently since small models rarely return the bare name.
    pub fn from_classifier_label(label: &str) -> Option<Self> {
        let lower = label.to_lowercase();
        if lower.contains("reminder") {
            Some(Self::Reminder)
        } else if lower.contains("product") {
            Some(Self::Product)
        } else if lower.contains("medvisor") || lower.contains("medical") {
            Some(Self::Medvisor)
        } else {
            None
        }
    }
}

/// A specialized agent definition
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub kind: AgentKind,
    /// Display name, also shown to the classifier
    pub name: String,
    /// One-line description used in the classifier prompt
    pub description: String,
    /// System prompt sent with every chat request to this agent
    pub system_prompt: String,
    /// Sampling temperature for this agent
    pub temperature: f32,
}

/// The three built-in agents
pub fn builtin_profiles() -> Vec<AgentProfile> {
    vec![
        AgentProfile {
            kind: AgentKind::Medvisor,
            name: "Medvisor".to_string(),
            description: "Temporary advice for medications and ways to get relief right now"
                .to_string(),
            system_prompt: "You are a medical advisor who gives advice based on the patient's \
                input. First suggest possible home remedies, then the related practical advice, \
                and mention the product category that helps with the problem (for example, \
                protein for a skinny build)."
                .to_string(),
            temperature: 0.7,
        },
        AgentProfile {
            kind: AgentKind::Product,
            name: "Product agent".to_string(),
            description: "Suggests healthcare products from the marketplace for the discussed \
                problem"
                .to_string(),
            system_prompt: "You are the pharmacy assistant who suggests healthcare products \
                from the marketplace. When product data is included in the prompt, base your \
                suggestions on it, and always name the concrete products you recommend."
                .to_string(),
            temperature: 0.8,
        },
        AgentProfile {
            kind: AgentKind::Reminder,
            name: "Reminder agent".to_string(),
            description: "Sets a reminder at a given time for a given purpose".to_string(),
            system_prompt: "You are an agent who sets reminders from the user's request. \
                Respond with the message, purpose and time separated into exactly three fields, \
                in this JSON format and nothing else:\n\
                ```json\n\
                {\n\
                  \"message\": \"\",\n\
                  \"purpose\": \"\",\n\
                  \"reminder_at\": \"\"\n\
                }\n\
                ```\n\
                Emit the JSON block exactly once."
                .to_string(),
            temperature: 0.6,
        },
    ]
}

/// Lookup table of agent profiles
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    profiles: Vec<AgentProfile>,
}

impl AgentRegistry {
    pub fn new(profiles: Vec<AgentProfile>) -> Self {
        Self { profiles }
    }

    pub fn get(&self, kind: AgentKind) -> Option<&AgentProfile> {
        self.profiles.iter().find(|p| p.kind == kind)
    }

    pub fn list(&self) -> &[AgentProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new(builtin_profiles())
    }
}
