//! OpenAI-compatible streaming generator.
//!
//! Works with any endpoint exposing the `/chat/completions` SSE protocol:
//! each line of the response body is blank, a `data: <json>` event, or the
//! literal `data: [DONE]` sentinel. Fragments are the incremental text at
//! `choices[0].delta.content`.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, trace, warn};

use scribeflow_config::ChatConfig;
use scribeflow_core::error::GeneratorError;
use scribeflow_core::generator::StreamGenerator;

/// A streaming generator backed by an OpenAI-compatible HTTP endpoint.
pub struct OpenAiCompatGenerator {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: usize,
    client: reqwest::Client,
}

impl OpenAiCompatGenerator {
    /// Create a new generator.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: usize,
        timeout: std::time::Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
            client,
        }
    }

    /// Build a generator from the application config.
    pub fn from_config(config: &ChatConfig) -> Result<Self, GeneratorError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            GeneratorError::NotConfigured("No API key in config or environment".into())
        })?;

        Ok(Self::new(
            "openai_compat",
            config.base_url.clone(),
            api_key,
            config.model.clone(),
            config.budget.max_tokens,
            std::time::Duration::from_secs(config.request_timeout_secs),
        ))
    }

    /// The wire request: model id, system context message followed by the
    /// user prompt message, a token cap, and the streaming flag.
    fn build_request_body(&self, prompt: &str, context: &str) -> serde_json::Value {
        let mut messages = Vec::new();
        if !context.is_empty() {
            messages.push(serde_json::json!({ "role": "system", "content": context }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": prompt }));

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "stream": true,
        })
    }
}

#[async_trait]
impl StreamGenerator for OpenAiCompatGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        context: &str,
    ) -> Result<
        tokio::sync::mpsc::Receiver<Result<String, GeneratorError>>,
        GeneratorError,
    > {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(prompt, context);

        debug!(generator = %self.name, model = %self.model, "Sending streaming request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout(e.to_string())
                } else {
                    GeneratorError::Network(e.to_string())
                }
            })?;

        // Fail fast on a non-success status, before yielding any fragment.
        let status = response.status().as_u16();

        if status == 429 {
            return Err(GeneratorError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(GeneratorError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Endpoint returned error");
            return Err(GeneratorError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let generator_name = self.name.clone();

        // Read the SSE byte stream and forward parsed fragments. The
        // response body is owned by this task, so the network resource is
        // released exactly once — when the task returns, on every path.
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut accumulator = SseAccumulator::new(generator_name);

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(GeneratorError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                for event in accumulator.push(&String::from_utf8_lossy(&bytes)) {
                    match event {
                        SseEvent::Fragment(text) => {
                            if tx.send(Ok(text)).await.is_err() {
                                return; // receiver dropped
                            }
                        }
                        SseEvent::Done => return,
                    }
                }
            }
            // Stream ended without [DONE] — closing the channel ends the
            // fragment sequence.
        });

        Ok(rx)
    }
}

/// One parsed SSE event.
#[derive(Debug, PartialEq)]
enum SseEvent {
    /// An incremental text fragment
    Fragment(String),
    /// The `[DONE]` sentinel
    Done,
}

/// Line-oriented SSE parser that buffers partial reads.
///
/// A line may span two reads; the incomplete trailing line is held back
/// until the next `push`. After `[DONE]` every further byte is ignored.
struct SseAccumulator {
    generator: String,
    buffer: String,
    done: bool,
}

impl SseAccumulator {
    fn new(generator: String) -> Self {
        Self {
            generator,
            buffer: String::new(),
            done: false,
        }
    }

    /// Feed one read's worth of text; returns the events completed by it.
    fn push(&mut self, chunk: &str) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }

        self.buffer.push_str(chunk);

        while let Some(line_end) = self.buffer.find('\n') {
            let line = self.buffer[..line_end].trim_end_matches('\r').to_string();
            self.buffer.drain(..=line_end);

            // Skip blank lines and SSE comments
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();

            if data == "[DONE]" {
                self.done = true;
                events.push(SseEvent::Done);
                return events;
            }

            match serde_json::from_str::<StreamResponse>(data) {
                Ok(parsed) => {
                    let fragment = parsed
                        .choices
                        .first()
                        .and_then(|c| c.delta.content.clone());
                    if let Some(text) = fragment
                        && !text.is_empty()
                    {
                        events.push(SseEvent::Fragment(text));
                    }
                }
                Err(e) => {
                    trace!(
                        generator = %self.generator,
                        data = %data,
                        error = %e,
                        "Ignoring unparseable SSE chunk"
                    );
                }
            }
        }

        events
    }
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[serde(default)]
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}
