//! Conversation ledger — the append-only ordered message store.
//!
//! Implementations (in-memory, file-backed) live in `scribeflow-ledger`.
//! Because the request gate serializes pipeline invocations, the ledger
//! needs no locking discipline beyond its own interior mutability.

use async_trait::async_trait;

use crate::error::LedgerError;
use crate::message::{ChatMessage, MessageMetadata};

/// The conversation store consumed by the pipeline.
#[async_trait]
pub trait ConversationLedger: Send + Sync {
    /// A short name identifying the backend ("in_memory", "file", ...).
    fn name(&self) -> &str;

    /// Append a message. Messages are immutable once appended, apart from
    /// post-hoc metadata attachment.
    async fn append(&self, message: ChatMessage) -> Result<(), LedgerError>;

    /// All messages in chronological (append) order.
    async fn list(&self) -> Result<Vec<ChatMessage>, LedgerError>;

    /// Evict oldest messages until at most `max_len` remain.
    /// Returns the number of evicted messages.
    async fn trim(&self, max_len: usize) -> Result<usize, LedgerError>;

    /// Flush to durable storage. A no-op for ephemeral backends.
    async fn persist(&self) -> Result<(), LedgerError>;

    /// Attach metadata to an already-appended message.
    /// Returns false when no message with that id exists.
    async fn attach_metadata(
        &self,
        id: &str,
        metadata: MessageMetadata,
    ) -> Result<bool, LedgerError>;
}
