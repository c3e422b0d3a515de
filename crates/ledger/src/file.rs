//! File-based ledger — persistent JSONL storage.
//!
//! Each line is a JSON-encoded `ChatMessage`. Messages live in memory and
//! are written out on `persist()`. Loading is an explicit import: a
//! malformed line is a hard error, never silently skipped.
//!
//! Storage location: `~/.scribeflow/conversations/history.jsonl`

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use scribeflow_core::error::LedgerError;
use scribeflow_core::ledger::ConversationLedger;
use scribeflow_core::message::{ChatMessage, MessageMetadata};

/// A file-backed ledger using JSONL (one JSON object per line).
pub struct FileLedger {
    path: PathBuf,
    messages: Arc<RwLock<Vec<ChatMessage>>>,
}

impl FileLedger {
    /// Create an empty ledger that will persist to `path`.
    /// The file is created on first `persist()`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Open a ledger, importing any messages already on disk.
    ///
    /// A missing file starts empty. A malformed line surfaces as
    /// [`LedgerError::Corrupt`] — imports never swallow bad data.
    pub fn open(path: PathBuf) -> Result<Self, LedgerError> {
        let messages = Self::import(&path)?;
        debug!(path = %path.display(), count = messages.len(), "File ledger loaded");
        Ok(Self {
            path,
            messages: Arc::new(RwLock::new(messages)),
        })
    }

    fn import(path: &PathBuf) -> Result<Vec<ChatMessage>, LedgerError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(LedgerError::Storage(format!(
                    "Failed to read ledger file: {e}"
                )));
            }
        };

        let mut messages = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let message: ChatMessage =
                serde_json::from_str(line).map_err(|e| LedgerError::Corrupt {
                    line: idx + 1,
                    reason: e.to_string(),
                })?;
            messages.push(message);
        }
        Ok(messages)
    }

    async fn flush(&self) -> Result<(), LedgerError> {
        let messages = self.messages.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LedgerError::Storage(format!("Failed to create ledger directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for message in messages.iter() {
            let line = serde_json::to_string(message)
                .map_err(|e| LedgerError::Storage(format!("Failed to serialize message: {e}")))?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&self.path, &content)
            .map_err(|e| LedgerError::Storage(format!("Failed to write ledger file: {e}")))?;

        debug!(path = %self.path.display(), count = messages.len(), "Ledger flushed");
        Ok(())
    }
}

#[async_trait]
impl ConversationLedger for FileLedger {
    fn name(&self) -> &str {
        "file"
    }

    async fn append(&self, message: ChatMessage) -> Result<(), LedgerError> {
        self.messages.write().await.push(message);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ChatMessage>, LedgerError> {
        Ok(self.messages.read().await.clone())
    }

    async fn trim(&self, max_len: usize) -> Result<usize, LedgerError> {
        let mut messages = self.messages.write().await;
        let evicted = messages.len().saturating_sub(max_len);
        if evicted > 0 {
            messages.drain(..evicted);
        }
        Ok(evicted)
    }

    async fn persist(&self) -> Result<(), LedgerError> {
        self.flush().await
    }

    async fn attach_metadata(
        &self,
        id: &str,
        metadata: MessageMetadata,
    ) -> Result<bool, LedgerError> {
        let mut messages = self.messages.write().await;
        match messages.iter_mut().find(|m| m.id == id) {
            Some(msg) => {
                msg.metadata = Some(metadata);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
