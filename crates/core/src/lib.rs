//! # Scribeflow Core
//!
//! Domain types, traits, and error definitions for the scribeflow chat
//! pipeline. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator the pipeline talks to (safety validation, editor
//! context, conversation storage, the streaming generator) is defined as a
//! trait here. Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod context;
pub mod error;
pub mod generator;
pub mod ledger;
pub mod message;
pub mod response;
pub mod safety;

// Re-export key types at crate root for ergonomics
pub use context::{ChatContext, ContextProvider};
pub use error::{GeneratorError, LedgerError};
pub use generator::StreamGenerator;
pub use ledger::ConversationLedger;
pub use message::{ChatMessage, MessageMetadata, Role};
pub use response::{ChatAction, ChatResponse, ErrorInfo, ErrorKind};
pub use safety::{SafetyValidator, ValidationReport};
