//! The message processing pipeline.
//!
//! One `process` call takes a user utterance through admission control,
//! safety validation, context gathering, token budget optimization, the
//! retried streaming generation call, sanitization, ledger bookkeeping,
//! and post-processing. Every path resolves to a [`ChatResponse`] — the
//! pipeline never returns an error to its caller.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use scribeflow_budget::{
    TokenBudget, TokenBudgetOptimizer, TokenLimitReport, estimate_tokens,
    optimize_conversation_history, validate_token_limits,
};
use scribeflow_config::ChatConfig;
use scribeflow_core::context::{ChatContext, ContextProvider};
use scribeflow_core::error::{GeneratorError, LedgerError};
use scribeflow_core::generator::StreamGenerator;
use scribeflow_core::ledger::ConversationLedger;
use scribeflow_core::message::{ChatMessage, MessageMetadata, Role};
use scribeflow_core::response::{ChatResponse, ErrorInfo, ErrorKind};
use scribeflow_core::safety::SafetyValidator;
use scribeflow_providers::with_retry_if;

use crate::gate::RequestGate;
use crate::post::ResponsePostProcessor;

/// The pipeline and its collaborators.
///
/// Collaborators are trait objects so deployments can swap backends
/// without touching the orchestration. The gate serializes invocations;
/// share one pipeline instance per conversation.
pub struct ChatPipeline {
    gate: RequestGate,
    validator: Arc<dyn SafetyValidator>,
    context_provider: Arc<dyn ContextProvider>,
    ledger: Arc<dyn ConversationLedger>,
    generator: Arc<dyn StreamGenerator>,
    optimizer: TokenBudgetOptimizer,
    post: ResponsePostProcessor,
    config: ChatConfig,
}

impl ChatPipeline {
    pub fn new(
        config: ChatConfig,
        validator: Arc<dyn SafetyValidator>,
        context_provider: Arc<dyn ContextProvider>,
        ledger: Arc<dyn ConversationLedger>,
        generator: Arc<dyn StreamGenerator>,
    ) -> Self {
        let budget = TokenBudget {
            max_tokens: config.budget.max_tokens,
            context_window: config.budget.context_window,
        };

        Self {
            gate: RequestGate::new(),
            validator,
            context_provider,
            ledger,
            generator,
            optimizer: TokenBudgetOptimizer::new(budget),
            post: ResponsePostProcessor::new(),
            config,
        }
    }

    /// Process one user utterance into a response.
    ///
    /// Rejected immediately when another request holds the gate. The gate
    /// pass is released on every exit path.
    pub async fn process(&self, text: &str) -> ChatResponse {
        let Some(_pass) = self.gate.try_admit() else {
            debug!("Rejecting request, another is in flight");
            return busy_response();
        };

        let started = Instant::now();

        let report = self.validator.validate_request(text);
        if !report.is_valid {
            info!(errors = ?report.errors, "Request blocked by safety validation");
            return validation_response(&report.errors);
        }
        for warning in &report.warnings {
            warn!(warning = %warning, "Safety validation warning");
        }

        let context = self.context_provider.current_context().await;
        let relevant = self.context_provider.relevant_context(text).await;

        let prior = match self.ledger.list().await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(error = %e, "Could not read conversation history");
                return ledger_failure_response(&e);
            }
        };

        let window =
            optimize_conversation_history(&prior, self.config.history.max_history_tokens);
        let context_text = render_context(&context, &relevant, &window);

        let limits = preflight_limits(text, &context, &relevant, &window, &self.optimizer.budget());
        for issue in &limits.issues {
            warn!(issue = %issue.issue, suggestion = %issue.suggestion, "Token limit finding");
        }

        let optimized = self.optimizer.optimize_prompt(text, &context_text, None);
        if optimized.tokens_saved > 0 {
            debug!(
                tokens_saved = optimized.tokens_saved,
                removed = ?optimized.removed_content,
                "Context reduced to fit budget"
            );
        }

        let outcome = with_retry_if(
            || self.run_generation(&optimized.optimized_prompt, &optimized.optimized_context),
            self.config.retry.attempts,
            Duration::from_millis(self.config.retry.base_delay_ms),
            GeneratorError::is_transient,
        )
        .await;

        let full_text = match outcome {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, generator = self.generator.name(), "Generation failed");
                return generation_failure_response(&e);
            }
        };

        let sanitized = self.validator.sanitize_response(&full_text);

        let user_message = ChatMessage::user_with_context(text, context);
        let assistant_message = ChatMessage::assistant(sanitized.clone());
        let assistant_id = assistant_message.id.clone();

        if let Err(e) = self.ledger.append(user_message).await {
            warn!(error = %e, "Failed to store user turn");
        }
        if let Err(e) = self.ledger.append(assistant_message.clone()).await {
            warn!(error = %e, "Failed to store assistant turn");
        }

        let metadata = MessageMetadata {
            token_count: Some(estimate_tokens(&sanitized)),
            processing_time_ms: Some(started.elapsed().as_millis() as u64),
            model: Some(self.config.model.clone()),
            truncated: false,
        };
        if let Err(e) = self
            .ledger
            .attach_metadata(&assistant_id, metadata.clone())
            .await
        {
            warn!(error = %e, "Failed to attach turn metadata");
        }

        match self.ledger.trim(self.config.history.max_messages).await {
            Ok(evicted) if evicted > 0 => {
                debug!(evicted, "Evicted oldest turns past the history limit");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to trim conversation history"),
        }
        if let Err(e) = self.ledger.persist().await {
            warn!(error = %e, "Failed to persist conversation history");
        }

        let suggestions = self.post.suggestions(&sanitized);
        let actions = self.post.actions(&sanitized);

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            response_chars = sanitized.len(),
            actions = actions.len(),
            "Turn completed"
        );

        ChatResponse {
            message: assistant_message.with_metadata(metadata),
            suggestions,
            actions,
            error: None,
        }
    }

    /// Start one generation call and accumulate its fragments. The first
    /// in-stream error aborts accumulation so the retry layer can decide
    /// whether to re-invoke.
    async fn run_generation(
        &self,
        prompt: &str,
        context: &str,
    ) -> Result<String, GeneratorError> {
        let mut rx = self.generator.generate(prompt, context).await?;
        let mut accumulated = String::new();

        while let Some(fragment) = rx.recv().await {
            accumulated.push_str(&fragment?);
        }

        Ok(accumulated)
    }
}

/// Pre-flight limit check. The history transcript ends up inside the
/// rendered context block, so history cost must be counted exactly once:
/// through the message slice, against an ambient-only rendering.
fn preflight_limits(
    prompt: &str,
    context: &ChatContext,
    relevant: &str,
    window: &[ChatMessage],
    budget: &TokenBudget,
) -> TokenLimitReport {
    let ambient = render_context(context, relevant, &[]);
    validate_token_limits(prompt, &ambient, window, budget)
}

/// Render the system-context block sent alongside the prompt: windowed
/// conversation history, retrieved context, then the editor snapshot.
fn render_context(context: &ChatContext, relevant: &str, history: &[ChatMessage]) -> String {
    let mut sections = Vec::new();

    if !history.is_empty() {
        let transcript: Vec<String> = history
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                format!("{role}: {}", m.content)
            })
            .collect();
        sections.push(format!("Previous conversation:\n{}", transcript.join("\n")));
    }

    if !relevant.is_empty() {
        sections.push(format!("Relevant context:\n{relevant}"));
    }

    if let Some(active_file) = &context.active_file {
        sections.push(format!("Active file: {active_file}"));
    }
    if let Some(selected) = &context.selected_text {
        sections.push(format!("Selected text:\n{selected}"));
    }
    if !context.workspace_files.is_empty() {
        sections.push(format!(
            "Workspace files: {}",
            context.workspace_files.join(", ")
        ));
    }
    if let Some(git_status) = &context.git_status {
        sections.push(format!("Git status: {git_status}"));
    }
    if let Some(spec) = &context.spec_context {
        sections.push(format!("Specification:\n{spec}"));
    }

    sections.join("\n\n")
}

fn busy_response() -> ChatResponse {
    ChatResponse::failed(
        ChatMessage::assistant(
            "I'm still working on your previous message. \
             Please wait for it to finish before sending another.",
        ),
        ErrorInfo::new(ErrorKind::Busy, "A request is already being processed"),
    )
}

fn validation_response(errors: &[String]) -> ChatResponse {
    let detail = errors.join("; ");
    ChatResponse::failed(
        ChatMessage::assistant(format!(
            "Your message was blocked by safety checks: {detail}"
        )),
        ErrorInfo::new(ErrorKind::Validation, detail),
    )
}

fn ledger_failure_response(error: &LedgerError) -> ChatResponse {
    ChatResponse::failed(
        ChatMessage::assistant(format!(
            "I apologize, but I couldn't access the conversation history: {error}. \
             Please try again."
        )),
        ErrorInfo::new(ErrorKind::System, error.to_string()),
    )
}

fn generation_failure_response(error: &GeneratorError) -> ChatResponse {
    let kind = match error {
        GeneratorError::AuthenticationFailed(_) => ErrorKind::Auth,
        GeneratorError::Network(_)
        | GeneratorError::Timeout(_)
        | GeneratorError::StreamInterrupted(_)
        | GeneratorError::RateLimited { .. } => ErrorKind::Network,
        GeneratorError::ApiError { .. } | GeneratorError::NotConfigured(_) => ErrorKind::System,
    };

    ChatResponse::failed(
        ChatMessage::assistant(format!(
            "I apologize, but I couldn't generate a response: {error}. Please try again."
        )),
        ErrorInfo::new(kind, error.to_string()),
    )
}
