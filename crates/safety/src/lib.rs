//! Safety validation for scribeflow — request screening and response
//! sanitization.
//!
//! The pipeline consumes the [`SafetyValidator`] trait from core; this
//! crate provides the rule-table-driven implementation. The tables are
//! plain data so deployments can swap in their own.

mod rules;
mod sanitize;

pub use rules::{RuleBasedValidator, SafetyRules};
pub use sanitize::sanitize_text;

use scribeflow_core::safety::{SafetyValidator, ValidationReport};

/// A validator that accepts everything and passes responses through
/// untouched. Useful for tests and fully-trusted deployments.
pub struct PassthroughValidator;

impl SafetyValidator for PassthroughValidator {
    fn validate_request(&self, _text: &str) -> ValidationReport {
        ValidationReport::valid()
    }

    fn sanitize_response(&self, text: &str) -> String {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_accepts_anything() {
        let report = PassthroughValidator.validate_request("rm -rf /");
        assert!(report.is_valid);
        assert_eq!(PassthroughValidator.sanitize_response("x\u{0007}y"), "x\u{0007}y");
    }
}
