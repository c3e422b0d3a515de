//! Error types for the scribeflow domain.
//!
//! Uses `thiserror` for ergonomic error definitions, one enum per bounded
//! context. There is deliberately no top-level error type: the pipeline
//! resolves every failure into a `ChatResponse`, so nothing upstream ever
//! needs to match across contexts.

use thiserror::Error;

/// Errors from the streaming generation call.
#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by endpoint, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Generator not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl GeneratorError {
    /// Whether a retry with backoff could plausibly succeed.
    ///
    /// Network failures, timeouts, interrupted streams, rate limits, and
    /// 5xx-class statuses are transient. Auth failures (401/403-class) and
    /// configuration problems are not, even though they surface at the
    /// network layer.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_)
            | Self::Timeout(_)
            | Self::StreamInterrupted(_)
            | Self::RateLimited { .. } => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_) | Self::NotConfigured(_) => false,
        }
    }
}

/// Errors from the conversation ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Message not found: {0}")]
    NotFound(String),

    #[error("Corrupt ledger data at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },
}
