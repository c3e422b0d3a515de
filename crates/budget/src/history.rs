//! Conversation history windowing.
//!
//! Walks the history from newest to oldest, keeping whole messages while
//! they fit. The most recent message is always retained in full, even when
//! it alone exceeds the budget. The first message that would overflow may
//! be included as a truncated copy when enough headroom remains; everything
//! older is dropped. Original relative ordering is preserved.

use tracing::debug;

use scribeflow_core::message::{ChatMessage, MessageMetadata};

use crate::token::{estimate_message_tokens, estimate_tokens};

/// Minimum content tokens a truncated boundary message must be able to
/// carry to be worth including at all.
pub const MIN_TRUNCATED_CONTENT_TOKENS: usize = 20;

/// Select the window of history messages that fits `max_history_tokens`.
pub fn optimize_conversation_history(
    messages: &[ChatMessage],
    max_history_tokens: usize,
) -> Vec<ChatMessage> {
    let Some((last, rest)) = messages.split_last() else {
        return Vec::new();
    };

    // Newest message is always kept in full.
    let mut kept_rev = vec![last.clone()];
    let mut used = estimate_message_tokens(last);

    for msg in rest.iter().rev() {
        let msg_tokens = estimate_message_tokens(msg);

        if used + msg_tokens <= max_history_tokens {
            kept_rev.push(msg.clone());
            used += msg_tokens;
            continue;
        }

        // First overflowing message: include a truncated copy when the
        // remaining headroom still buys a useful amount of content.
        let headroom = max_history_tokens.saturating_sub(used);
        let non_content = msg_tokens - estimate_tokens(&msg.content);
        let allowed_content = headroom.saturating_sub(non_content);

        if allowed_content > MIN_TRUNCATED_CONTENT_TOKENS {
            kept_rev.push(truncate_message(msg, allowed_content));
        }

        // Older messages beyond this point are dropped entirely.
        break;
    }

    kept_rev.reverse();

    if kept_rev.len() < messages.len() {
        debug!(
            kept = kept_rev.len(),
            total = messages.len(),
            budget = max_history_tokens,
            "History window dropped older messages"
        );
    }

    kept_rev
}

/// A copy of `msg` with content cut to `allowed_tokens`, marked truncated.
/// The original id is preserved.
fn truncate_message(msg: &ChatMessage, allowed_tokens: usize) -> ChatMessage {
    let mut cut = (allowed_tokens * 4).min(msg.content.len());
    while cut > 0 && !msg.content.is_char_boundary(cut) {
        cut -= 1;
    }

    let mut metadata = msg.metadata.clone().unwrap_or_default();
    metadata.truncated = true;

    let mut copy = msg.clone();
    copy.content = msg.content[..cut].to_string();
    copy.metadata = Some(metadata);
    copy
}
