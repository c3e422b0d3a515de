//! Stream generator — the abstraction over the remote generation endpoint.
//!
//! A generator turns a prompt + context into a lazy, finite, non-restartable
//! sequence of text fragments. The pipeline consumes the receiver until it
//! closes; implementations release the underlying network resource exactly
//! once regardless of how the stream ends.

use async_trait::async_trait;

use crate::error::GeneratorError;

/// The streaming generation collaborator.
///
/// `generate` must fail fast — before yielding any fragment — when the
/// initiating call returns a non-success status. Once a receiver is
/// returned, per-fragment failures arrive through it.
#[async_trait]
pub trait StreamGenerator: Send + Sync {
    /// A human-readable name for this generator.
    fn name(&self) -> &str;

    /// Start a generation call and return the fragment stream.
    async fn generate(
        &self,
        prompt: &str,
        context: &str,
    ) -> Result<
        tokio::sync::mpsc::Receiver<Result<String, GeneratorError>>,
        GeneratorError,
    >;
}
