//! Conversation ledger backends.
//!
//! Two implementations of [`scribeflow_core::ConversationLedger`]:
//! - [`InMemoryLedger`] — ephemeral, for tests and throwaway sessions
//! - [`FileLedger`] — JSONL file persistence, one message per line

mod file;
mod in_memory;

pub use file::FileLedger;
pub use in_memory::InMemoryLedger;
