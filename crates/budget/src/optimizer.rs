//! Prompt/context optimization — ordered, cumulative reduction strategies.
//!
//! When prompt + context exceed the target, strategies are applied in a
//! fixed order until the deficit is covered or strategies exhaust:
//!
//! 1. Truncate the context from its start (the tail is the most recent and
//!    most relevant portion), proportional to the tokens still owed
//! 2. Strip comment-like lines
//! 3. Collapse blank-line runs and repeated horizontal whitespace
//! 4. Strip import-style declaration lines
//!
//! The prompt itself is never touched — only the context is reduced. Each
//! applied strategy records a human-readable description of what was
//! removed.

use tracing::debug;

use crate::TokenBudget;
use crate::token::estimate_tokens;

/// The outcome of one `optimize_prompt` call. Produced fresh per call.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// The prompt, unchanged (prompts are never truncated)
    pub optimized_prompt: String,
    /// The context after reduction
    pub optimized_context: String,
    /// Human-readable descriptions of what each applied strategy removed
    pub removed_content: Vec<String>,
    /// Estimated tokens saved across all strategies
    pub tokens_saved: usize,
}

/// Trims prompt, context, and history to fit a token budget.
/// Stateless apart from the read-only budget — create one and reuse it.
pub struct TokenBudgetOptimizer {
    budget: TokenBudget,
}

impl TokenBudgetOptimizer {
    /// Create a new optimizer with the given budget.
    pub fn new(budget: TokenBudget) -> Self {
        Self { budget }
    }

    /// Create an optimizer with the default budget.
    pub fn with_default_budget() -> Self {
        Self::new(TokenBudget::default())
    }

    /// The configured budget.
    pub fn budget(&self) -> TokenBudget {
        self.budget
    }

    /// Default optimization target: the window minus the completion budget,
    /// so the response always has room.
    fn default_target(&self) -> usize {
        self.budget
            .context_window
            .saturating_sub(self.budget.max_tokens)
    }

    /// Reduce `context` until `prompt + context` fit within the target.
    ///
    /// A no-op (zero savings, empty removal log) when the input is already
    /// within budget.
    pub fn optimize_prompt(
        &self,
        prompt: &str,
        context: &str,
        target_tokens: Option<usize>,
    ) -> OptimizationResult {
        let target = target_tokens.unwrap_or_else(|| self.default_target());
        let prompt_tokens = estimate_tokens(prompt);
        let initial_total = prompt_tokens + estimate_tokens(context);

        if initial_total <= target {
            return OptimizationResult {
                optimized_prompt: prompt.to_string(),
                optimized_context: context.to_string(),
                removed_content: Vec::new(),
                tokens_saved: 0,
            };
        }

        let mut ctx = context.to_string();
        let mut removed = Vec::new();

        let over = |ctx: &str| prompt_tokens + estimate_tokens(ctx) > target;

        // Strategy 1: cut the start of the context, keeping the tail,
        // proportional to the tokens still owed.
        if over(&ctx) {
            let owed = prompt_tokens + estimate_tokens(&ctx) - target;
            let (trimmed, description) = truncate_context_start(&ctx, owed);
            if let Some(d) = description {
                removed.push(d);
            }
            ctx = trimmed;
        }

        // Strategy 2: comment-like lines carry little prompt value.
        if over(&ctx) {
            let (stripped, description) = strip_comment_lines(&ctx);
            if let Some(d) = description {
                removed.push(d);
            }
            ctx = stripped;
        }

        // Strategy 3: collapse redundant whitespace.
        if over(&ctx) {
            let before = estimate_tokens(&ctx);
            let collapsed = collapse_whitespace(&ctx);
            let saved = before.saturating_sub(estimate_tokens(&collapsed));
            if saved > 0 {
                removed.push(format!(
                    "Collapsed blank lines and repeated whitespace ({saved} tokens)"
                ));
            }
            ctx = collapsed;
        }

        // Strategy 4: import-style declarations.
        if over(&ctx) {
            let (stripped, description) = strip_import_lines(&ctx);
            if let Some(d) = description {
                removed.push(d);
            }
            ctx = stripped;
        }

        let final_total = prompt_tokens + estimate_tokens(&ctx);
        let tokens_saved = initial_total.saturating_sub(final_total);

        debug!(
            target,
            initial_total,
            final_total,
            strategies_applied = removed.len(),
            "Optimized prompt context"
        );

        OptimizationResult {
            optimized_prompt: prompt.to_string(),
            optimized_context: ctx,
            removed_content: removed,
            tokens_saved,
        }
    }
}

/// Cut roughly `owed` tokens' worth of characters from the start of the
/// context, keeping the tail.
fn truncate_context_start(context: &str, owed: usize) -> (String, Option<String>) {
    let chars_to_cut = (owed * 4).min(context.len());
    if chars_to_cut == 0 {
        return (context.to_string(), None);
    }

    let mut cut = chars_to_cut;
    while cut < context.len() && !context.is_char_boundary(cut) {
        cut += 1;
    }

    let removed_tokens = estimate_tokens(&context[..cut]);
    let kept = context[cut..].to_string();
    (
        kept,
        Some(format!(
            "Truncated {removed_tokens} tokens from the start of the context"
        )),
    )
}

fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//")
        || trimmed.starts_with('#')
        || trimmed.starts_with("/*")
        || trimmed.starts_with("* ")
        || trimmed.starts_with("<!--")
}

fn strip_comment_lines(context: &str) -> (String, Option<String>) {
    let mut kept = Vec::new();
    let mut removed = 0usize;
    for line in context.lines() {
        if is_comment_line(line) {
            removed += 1;
        } else {
            kept.push(line);
        }
    }
    if removed == 0 {
        return (context.to_string(), None);
    }
    (
        kept.join("\n"),
        Some(format!("Stripped {removed} comment lines from the context")),
    )
}

/// Collapse runs of blank lines to a single blank line and runs of spaces
/// or tabs within a line to a single space.
fn collapse_whitespace(context: &str) -> String {
    let mut out = Vec::new();
    let mut previous_blank = false;
    for line in context.lines() {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        previous_blank = blank;

        let mut collapsed = String::with_capacity(line.len());
        let mut in_run = false;
        for c in line.chars() {
            if c == ' ' || c == '\t' {
                if !in_run {
                    collapsed.push(' ');
                    in_run = true;
                }
            } else {
                collapsed.push(c);
                in_run = false;
            }
        }
        out.push(collapsed);
    }
    out.join("\n")
}

fn is_import_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("import ")
        || trimmed.starts_with("use ")
        || trimmed.starts_with("from ")
        || trimmed.starts_with("#include")
        || trimmed.starts_with("extern crate ")
        || trimmed.starts_with("require(")
}

fn strip_import_lines(context: &str) -> (String, Option<String>) {
    let mut kept = Vec::new();
    let mut removed = 0usize;
    for line in context.lines() {
        if is_import_line(line) {
            removed += 1;
        } else {
            kept.push(line);
        }
    }
    if removed == 0 {
        return (context.to_string(), None);
    }
    (
        kept.join("\n"),
        Some(format!("Stripped {removed} import lines from the context")),
    )
}
