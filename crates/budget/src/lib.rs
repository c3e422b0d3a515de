//! Token budget optimization — the core algorithmic component.
//!
//! Everything the pipeline sends to the generation endpoint passes through
//! here first:
//!
//! 1. **Token estimation** (`token`) — a deterministic character-based
//!    heuristic, not a real tokenizer
//! 2. **Prompt optimization** (`optimizer`) — ordered reduction strategies
//!    applied to the context (never the prompt) until the budget fits
//! 3. **History windowing** (`history`) — newest-first sliding window over
//!    the conversation, with a single truncated boundary message
//! 4. **Limit validation** (`limits`) — pre-flight checks pairing each
//!    finding with an actionable suggestion
//!
//! # Determinism
//!
//! Token estimation is a pure function of text length, so optimization is
//! reproducible given identical inputs. No random or time-dependent logic.

pub mod history;
pub mod limits;
pub mod optimizer;
pub mod token;

pub use history::optimize_conversation_history;
pub use limits::{TokenLimitIssue, TokenLimitReport, validate_token_limits};
pub use optimizer::{OptimizationResult, TokenBudgetOptimizer};
pub use token::{MESSAGE_OVERHEAD_TOKENS, estimate_message_tokens, estimate_tokens};

use serde::{Deserialize, Serialize};

/// Process-lifetime token budget configuration, read-only to the optimizer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenBudget {
    /// Maximum completion tokens requested from the endpoint
    pub max_tokens: usize,
    /// Total context window the request must fit within
    pub context_window: usize,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            context_window: 16384,
        }
    }
}
