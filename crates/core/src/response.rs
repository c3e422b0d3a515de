//! Pipeline response types.
//!
//! Every pipeline invocation resolves to a [`ChatResponse`] — failures are
//! represented as an error-carrying response, never as a propagated error.

use serde::{Deserialize, Serialize};

use crate::message::ChatMessage;

/// The result of one pipeline invocation.
///
/// Exactly one of a normal assistant message or an error-carrying assistant
/// message is produced per invocation; `message` is always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The assistant message for this turn
    pub message: ChatMessage,

    /// Follow-up suggestions derived from the response text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,

    /// Structured actions derived from the response text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ChatAction>,

    /// Error details when the turn failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ChatResponse {
    /// A successful response with no suggestions or actions yet.
    pub fn ok(message: ChatMessage) -> Self {
        Self {
            message,
            suggestions: Vec::new(),
            actions: Vec::new(),
            error: None,
        }
    }

    /// An error response wrapping an apology-style assistant message.
    pub fn failed(message: ChatMessage, error: ErrorInfo) -> Self {
        Self {
            message,
            suggestions: Vec::new(),
            actions: Vec::new(),
            error: Some(error),
        }
    }

    /// Whether this response carries an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A structured action the editor can offer to apply.
///
/// Discriminated by the `type` tag on the wire, one payload shape per
/// variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatAction {
    /// Create a new file from a code block in the response
    CreateFile {
        content: String,
        language: String,
        description: String,
    },
    /// Modify an existing file
    ModifyFile {
        path: String,
        content: String,
        description: String,
    },
    /// Run a shell command
    RunCommand {
        command: String,
        description: String,
    },
    /// Start drafting a specification
    CreateSpec { description: String },
}

/// Classification of a failed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Safety check rejected the input
    Validation,
    /// Another request was already in flight
    Busy,
    /// Network-layer failure (retryable)
    Network,
    /// Authentication/authorization failure
    Auth,
    /// Everything else (retryable)
    System,
}

/// Error details carried in a failed [`ChatResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error classification
    #[serde(rename = "type")]
    pub kind: ErrorKind,

    /// Human-readable description
    pub message: String,

    /// Whether a UI-level retry affordance makes sense.
    /// True only for network/system classifications.
    pub retryable: bool,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let retryable = matches!(kind, ErrorKind::Network | ErrorKind::System);
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }
}
