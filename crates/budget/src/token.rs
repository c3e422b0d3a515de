//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token. This
//! approximation is accurate within ~10% for BPE tokenizers on English
//! text; it is **not** a real tokenizer and is documented as such.

use scribeflow_core::message::ChatMessage;

/// Per-message structural overhead: role name, delimiters, and formatting
/// markers in the API wire format cost roughly this many tokens.
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up. Empty input is zero.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.len().div_ceil(4)
}

/// Estimate tokens for a single message including per-message overhead and
/// the cost of any attached context fields.
pub fn estimate_message_tokens(message: &ChatMessage) -> usize {
    let mut tokens = MESSAGE_OVERHEAD_TOKENS + estimate_tokens(&message.content);

    if let Some(ctx) = &message.context {
        if let Some(active_file) = &ctx.active_file {
            tokens += estimate_tokens(active_file);
        }
        if let Some(selected) = &ctx.selected_text {
            tokens += estimate_tokens(selected);
        }
        for path in &ctx.workspace_files {
            tokens += estimate_tokens(path);
        }
    }

    tokens
}

/// Estimate tokens for a slice of messages.
pub fn estimate_messages_tokens(messages: &[ChatMessage]) -> usize {
    messages.iter().map(estimate_message_tokens).sum()
}
