//! Safety validation — the collaborator that screens requests and
//! sanitizes responses.
//!
//! The concrete rule tables live in the `scribeflow-safety` crate; the
//! pipeline only consumes this trait.

/// Result of screening a request against the safety rules.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Whether the request may proceed
    pub is_valid: bool,
    /// Hard failures that block the request
    pub errors: Vec<String>,
    /// Soft findings that do not block
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// A report that passes with no findings.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// A report that blocks the request.
    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors,
            warnings: Vec::new(),
        }
    }
}

/// The safety collaborator.
pub trait SafetyValidator: Send + Sync {
    /// Screen an incoming request. A failed report blocks the turn before
    /// any generator call happens.
    fn validate_request(&self, text: &str) -> ValidationReport;

    /// Sanitize the final response text before it reaches the user.
    fn sanitize_response(&self, text: &str) -> String;
}
