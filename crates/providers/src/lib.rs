//! Generation endpoint client and retry coordination.
//!
//! [`OpenAiCompatGenerator`] implements the core `StreamGenerator` trait
//! against any OpenAI-compatible `/chat/completions` endpoint (streaming
//! SSE). [`retry::with_retry`] wraps fallible async operations with linear
//! backoff; it is policy-agnostic — the caller decides which errors are
//! worth retrying.

pub mod openai_compat;
pub mod retry;

pub use openai_compat::OpenAiCompatGenerator;
pub use retry::{with_retry, with_retry_if};
