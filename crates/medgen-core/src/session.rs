//! Conversation session bookkeeping
//!
//! An append-only transcript per session, plus the rolling context summary
//! that is prefixed to each outbound routing call. The session identity is
//! an explicit context value handed in at construction, never process-wide
//! state.

use serde::{Deserialize, Serialize};

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
    System,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Agent => write!(f, "Assistant"),
            Self::System => write!(f, "System"),
        }
    }
}

/// A single transcript entry. Immutable once stored; ordering within the
/// session is the implicit timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub content: String,
}

/// Identity for one conversation session, passed by value to whoever needs
/// it instead of living in a global.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub user: String,
}

impl SessionContext {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            user: user.into(),
        }
    }
}

/// Append-only transcript with a rolling context summary
pub struct ConversationSession {
    context: SessionContext,
    messages: Vec<Message>,
    /// How many trailing user/agent messages feed the context summary
    context_turns: usize,
}

impl ConversationSession {
    /// Create a session. The transcript opens with a system marker entry
    /// recording the session id, so after N user turns and N agent replies
    /// it holds exactly 2N+1 entries.
    pub fn new(context: SessionContext) -> Self {
        let marker = format!("session ID: {}", context.session_id);
        Self {
            context,
            messages: vec![Message {
                sender: Sender::System,
                content: marker,
            }],
            context_turns: 6,
        }
    }

    /// Set how many trailing messages feed the context summary
    pub fn with_context_turns(mut self, context_turns: usize) -> Self {
        self.context_turns = context_turns;
        self
    }

    /// Append a message to the transcript
    pub fn record(&mut self, sender: Sender, content: impl Into<String>) {
        self.messages.push(Message {
            sender,
            content: content.into(),
        });
    }

    pub fn session_id(&self) -> &str {
        &self.context.session_id
    }

    pub fn user(&self) -> &str {
        &self.context.user
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Rolling summary of the recent conversation, fed back into each
    /// routing call for context.
    pub fn context_summary(&self) -> String {
        let mut summary = String::from("Previous conversation:\n");
        let recent: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| m.sender != Sender::System)
            .collect();
        let start = recent.len().saturating_sub(self.context_turns);
        for msg in &recent[start..] {
            summary.push_str(&format!("{}: {}\n", msg.sender, msg.content));
        }
        summary
    }

    /// The enriched string handed to the router for one user turn
    pub fn enrich(&self, user_message: &str) -> String {
        format!(
            "{}\nCurrent user message: {}",
            self.context_summary(),
            user_message
        )
    }

    /// Render the entire conversation history in a formatted way
    pub fn render_transcript(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("\n{}\n", "=".repeat(50)));
        out.push_str("Conversation History:\n");
        out.push_str(&format!("{}\n", "=".repeat(50)));
        for msg in &self.messages {
            out.push_str(&format!("\n{}: {}\n", msg.sender, msg.content));
        }
        out.push_str(&format!("\n{}\n", "=".repeat(50)));
        out
    }
}
