//! Response post-processing.
//!
//! Derives follow-up suggestions and structured editor actions from the
//! final response text. Everything here is deterministic string scanning;
//! the keyword tables are compiled-in constants.

use scribeflow_core::response::ChatAction;

/// Upper bound on suggestions per response.
const MAX_SUGGESTIONS: usize = 3;

/// A code block shorter than this is not worth a create-file action.
const MIN_ACTION_CODE_CHARS: usize = 50;

/// Keyword groups scanned against the lower-cased response text, each
/// paired with the suggestion it produces.
const KEYWORD_SUGGESTIONS: &[(&[&str], &str)] = &[
    (
        &["code", "function"],
        "Would you like me to explain this code in more detail?",
    ),
    (
        &["error", "bug"],
        "Would you like help debugging this issue?",
    ),
    (
        &["spec", "requirements"],
        "Should I draft a specification for this?",
    ),
];

/// Suggestions used to pad out the list when keyword matching produced
/// fewer than the maximum.
const GENERIC_SUGGESTIONS: &[&str] = &[
    "Tell me more about what you're building",
    "Can you show me the relevant code?",
    "What would you like to do next?",
];

/// Derives suggestions and actions from response text.
#[derive(Debug, Default)]
pub struct ResponsePostProcessor;

impl ResponsePostProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Up to three follow-up suggestions: one per matching keyword group,
    /// padded from the generic list.
    pub fn suggestions(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut out = Vec::new();

        for (keywords, suggestion) in KEYWORD_SUGGESTIONS {
            if out.len() == MAX_SUGGESTIONS {
                break;
            }
            if keywords.iter().any(|k| lowered.contains(k)) {
                out.push((*suggestion).to_string());
            }
        }

        for generic in GENERIC_SUGGESTIONS {
            if out.len() == MAX_SUGGESTIONS {
                break;
            }
            out.push((*generic).to_string());
        }

        out
    }

    /// Structured actions, in order of appearance in the text.
    ///
    /// Every language-tagged fenced code block longer than the minimum
    /// yields a create-file action. A response that mentions both "create"
    /// and "spec" additionally yields a create-spec action.
    pub fn actions(&self, text: &str) -> Vec<ChatAction> {
        let mut actions: Vec<ChatAction> = extract_code_blocks(text)
            .into_iter()
            .filter(|block| block.code.len() > MIN_ACTION_CODE_CHARS)
            .map(|block| ChatAction::CreateFile {
                description: format!("Create a new {} file", block.language),
                content: block.code,
                language: block.language,
            })
            .collect();

        let lowered = text.to_lowercase();
        if lowered.contains("create") && lowered.contains("spec") {
            actions.push(ChatAction::CreateSpec {
                description: "Draft a specification from this conversation".to_string(),
            });
        }

        actions
    }
}

struct CodeBlock {
    language: String,
    code: String,
}

/// Collect fenced code blocks that carry a language tag. An unterminated
/// block at the end of the text is ignored.
fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<CodeBlock> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        match current.as_mut() {
            None => {
                if let Some(tag) = trimmed.strip_prefix("```") {
                    let language = tag.trim();
                    if !language.is_empty() {
                        current = Some(CodeBlock {
                            language: language.to_string(),
                            code: String::new(),
                        });
                    }
                }
            }
            Some(block) => {
                if trimmed == "```" {
                    let mut finished = current.take().unwrap_or(CodeBlock {
                        language: String::new(),
                        code: String::new(),
                    });
                    // Drop the trailing newline added by the line loop.
                    if finished.code.ends_with('\n') {
                        finished.code.pop();
                    }
                    blocks.push(finished);
                } else {
                    block.code.push_str(line);
                    block.code.push('\n');
                }
            }
        }
    }

    blocks
}
