//! Chat message domain types.
//!
//! These are the core value objects that flow through the pipeline:
//! User sends an utterance → gate admits it → optimizer trims it →
//! generator streams a reply → ledger stores both turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::ChatContext;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

/// A single message in a conversation.
///
/// Messages are immutable once appended to the ledger, with one exception:
/// metadata may be attached post-hoc (token counts, timing) via
/// [`crate::ConversationLedger::attach_metadata`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Editor context snapshot captured when the message was created.
    /// Never mutated afterward.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ChatContext>,

    /// Optional metadata (token counts, timing, model info)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl ChatMessage {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            context: None,
            metadata: None,
        }
    }

    /// Create a new user message with an editor context snapshot.
    pub fn user_with_context(content: impl Into<String>, context: ChatContext) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            context: Some(context),
            metadata: None,
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            context: None,
            metadata: None,
        }
    }

    /// Attach metadata, consuming and returning the message.
    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Whether this message was truncated during history optimization.
    pub fn is_truncated(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.truncated)
    }
}

/// Metadata attached to a message after processing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Estimated token count of the content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<usize>,

    /// Wall-clock processing time for the turn that produced this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,

    /// Which model generated this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Set when history optimization cut the content to fit the budget
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl MessageMetadata {
    /// Metadata marking a message as truncated by history optimization.
    pub fn truncated() -> Self {
        Self {
            truncated: true,
            ..Self::default()
        }
    }
}
