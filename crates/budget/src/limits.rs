//! Pre-flight token limit validation.
//!
//! Computes total estimated tokens across prompt, context, and history and
//! flags issues before the generation call, pairing each finding with an
//! actionable suggestion.

use scribeflow_core::message::ChatMessage;

use crate::TokenBudget;
use crate::token::{estimate_messages_tokens, estimate_tokens};

/// One finding with an actionable suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenLimitIssue {
    pub issue: String,
    pub suggestion: String,
}

/// The result of a token limit validation pass.
#[derive(Debug, Clone)]
pub struct TokenLimitReport {
    /// True when no issue was found
    pub within_limits: bool,
    /// Total estimated tokens across prompt + context + history
    pub total_tokens: usize,
    /// Findings, each paired with a suggestion
    pub issues: Vec<TokenLimitIssue>,
}

/// Validate prompt, context, and history against the budget.
pub fn validate_token_limits(
    prompt: &str,
    context: &str,
    history: &[ChatMessage],
    budget: &TokenBudget,
) -> TokenLimitReport {
    let prompt_tokens = estimate_tokens(prompt);
    let context_tokens = estimate_tokens(context);
    let history_tokens = estimate_messages_tokens(history);
    let total_tokens = prompt_tokens + context_tokens + history_tokens;

    let mut issues = Vec::new();

    if total_tokens > budget.context_window {
        issues.push(TokenLimitIssue {
            issue: format!(
                "Total estimated tokens ({total_tokens}) exceed the context window ({})",
                budget.context_window
            ),
            suggestion: "Reduce attached context or let history optimization drop older turns"
                .into(),
        });
    }

    let response_headroom = budget.context_window.saturating_sub(total_tokens);
    if response_headroom < budget.max_tokens / 10 {
        issues.push(TokenLimitIssue {
            issue: format!(
                "Only {response_headroom} tokens of headroom remain for the response \
                 (below 10% of the {} completion budget)",
                budget.max_tokens
            ),
            suggestion: "Shorten the prompt or context to leave room for a complete response"
                .into(),
        });
    }

    if prompt_tokens > budget.max_tokens / 2 {
        issues.push(TokenLimitIssue {
            issue: format!(
                "Prompt alone is {prompt_tokens} tokens, over 50% of the {} token maximum",
                budget.max_tokens
            ),
            suggestion: "Move background detail out of the prompt and into context".into(),
        });
    }

    if context_tokens > budget.context_window * 3 / 10 {
        issues.push(TokenLimitIssue {
            issue: format!(
                "Context alone is {context_tokens} tokens, over 30% of the {} token window",
                budget.context_window
            ),
            suggestion: "Select a smaller region or rely on relevant-context retrieval".into(),
        });
    }

    TokenLimitReport {
        within_limits: issues.is_empty(),
        total_tokens,
        issues,
    }
}
