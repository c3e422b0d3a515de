//! In-memory ledger — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use scribeflow_core::error::LedgerError;
use scribeflow_core::ledger::ConversationLedger;
use scribeflow_core::message::{ChatMessage, MessageMetadata};

/// An in-memory ledger that stores messages in a Vec, in append order.
pub struct InMemoryLedger {
    messages: Arc<RwLock<Vec<ChatMessage>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationLedger for InMemoryLedger {
    fn name(&self) -> &str {
        "in_memory"
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
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_and_list_preserve_order() {
        let ledger = InMemoryLedger::new();
        ledger.append(ChatMessage::user("first")).await.unwrap();
        ledger.append(ChatMessage::assistant("second")).await.unwrap();

        let messages = ledger.list().await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "second");
    }

    #[tokio::test]
    async fn trim_evicts_oldest_first() {
        let ledger = InMemoryLedger::new();
        for i in 0..5 {
            ledger.append(ChatMessage::user(format!("msg {i}"))).await.unwrap();
        }

        let evicted = ledger.trim(3).await.unwrap();
        assert_eq!(evicted, 2);

        let messages = ledger.list().await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "msg 2");
        assert_eq!(messages[2].content, "msg 4");
    }

    #[tokio::test]
    async fn trim_below_length_is_a_noop() {
        let ledger = InMemoryLedger::new();
        ledger.append(ChatMessage::user("only")).await.unwrap();
        assert_eq!(ledger.trim(10).await.unwrap(), 0);
        assert_eq!(ledger.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn attach_metadata_post_hoc() {
        let ledger = InMemoryLedger::new();
        let msg = ChatMessage::assistant("reply");
        let id = msg.id.clone();
        ledger.append(msg).await.unwrap();

        let metadata = MessageMetadata {
            token_count: Some(12),
            model: Some("gpt-4o-mini".into()),
            ..Default::default()
        };
        assert!(ledger.attach_metadata(&id, metadata).await.unwrap());

        let messages = ledger.list().await.unwrap();
        let attached = messages[0].metadata.as_ref().unwrap();
        assert_eq!(attached.token_count, Some(12));
    }

    #[tokio::test]
    async fn attach_metadata_unknown_id() {
        let ledger = InMemoryLedger::new();
        let attached = ledger
            .attach_metadata("no-such-id", MessageMetadata::default())
            .await
            .unwrap();
        assert!(!attached);
    }
}
