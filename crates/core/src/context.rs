//! Editor context — the ambient state attached to a user message.
//!
//! Context gathering itself (reading files, querying git) lives outside the
//! pipeline; the pipeline only consumes the [`ContextProvider`] trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A snapshot of the editor/workspace state at message-creation time.
///
/// Every field is best-effort: a provider may leave any of them empty when
/// gathering partially fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatContext {
    /// Path of the file open in the active editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_file: Option<String>,

    /// Currently selected text, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_text: Option<String>,

    /// Paths of other open/relevant workspace files
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspace_files: Vec<String>,

    /// Short git status summary (branch, dirty files)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_status: Option<String>,

    /// Active specification excerpt, when the workspace has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_context: Option<String>,
}

impl ChatContext {
    /// True when no field carries any information.
    pub fn is_empty(&self) -> bool {
        self.active_file.is_none()
            && self.selected_text.is_none()
            && self.workspace_files.is_empty()
            && self.git_status.is_none()
            && self.spec_context.is_none()
    }
}

/// The collaborator that gathers editor/workspace context.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Snapshot the current editor state. Best-effort: individual fields may
    /// be absent on partial failure, but the call itself does not fail.
    async fn current_context(&self) -> ChatContext;

    /// Retrieve context text relevant to a query, for inclusion in the
    /// generation prompt. Empty string when nothing relevant exists.
    async fn relevant_context(&self, query: &str) -> String;
}
