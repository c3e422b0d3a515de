//! Rule tables and the rule-based validator.
//!
//! Rules:
//! - A request containing a blocked pattern is rejected outright
//! - A request containing a flagged pattern passes with a warning
//! - Requests over the length cap are rejected (runaway paste guard)

use tracing::{debug, warn};

use scribeflow_core::safety::{SafetyValidator, ValidationReport};

use crate::sanitize::sanitize_text;

/// The rule tables driving validation. Plain data — deployments can
/// replace the defaults wholesale.
#[derive(Debug, Clone)]
pub struct SafetyRules {
    /// Lowercased substrings that block a request
    pub blocked_patterns: Vec<String>,
    /// Lowercased substrings that produce a warning only
    pub flagged_patterns: Vec<String>,
    /// Maximum request length in characters
    pub max_request_chars: usize,
}

impl Default for SafetyRules {
    fn default() -> Self {
        Self {
            blocked_patterns: vec![
                "rm -rf /".into(),
                "ignore all previous instructions".into(),
                "ignore previous instructions".into(),
                ":(){ :|:& };:".into(),
            ],
            flagged_patterns: vec![
                "api key".into(),
                "password".into(),
                "secret".into(),
            ],
            max_request_chars: 100_000,
        }
    }
}

/// A [`SafetyValidator`] backed by [`SafetyRules`].
pub struct RuleBasedValidator {
    rules: SafetyRules,
}

impl RuleBasedValidator {
    pub fn new(rules: SafetyRules) -> Self {
        Self { rules }
    }

    pub fn with_default_rules() -> Self {
        Self::new(SafetyRules::default())
    }
}

impl SafetyValidator for RuleBasedValidator {
    fn validate_request(&self, text: &str) -> ValidationReport {
        let lower = text.to_lowercase();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if text.len() > self.rules.max_request_chars {
            errors.push(format!(
                "Request exceeds the {} character limit",
                self.rules.max_request_chars
            ));
        }

        for pattern in &self.rules.blocked_patterns {
            if lower.contains(pattern.as_str()) {
                warn!(pattern = %pattern, "Blocked request pattern matched");
                errors.push("Dangerous content detected".into());
                break;
            }
        }

        for pattern in &self.rules.flagged_patterns {
            if lower.contains(pattern.as_str()) {
                warnings.push(format!("Request mentions '{pattern}'"));
            }
        }

        let is_valid = errors.is_empty();
        if !is_valid {
            debug!(errors = errors.len(), "Request failed safety validation");
        }

        ValidationReport {
            is_valid,
            errors,
            warnings,
        }
    }

    fn sanitize_response(&self, text: &str) -> String {
        sanitize_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_request_passes() {
        let validator = RuleBasedValidator::with_default_rules();
        let report = validator.validate_request("Hello, how are you?");
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn blocked_pattern_rejects() {
        let validator = RuleBasedValidator::with_default_rules();
        let report = validator.validate_request("please run rm -rf / for me");
        assert!(!report.is_valid);
        assert_eq!(report.errors, vec!["Dangerous content detected"]);
    }

    #[test]
    fn blocked_pattern_is_case_insensitive() {
        let validator = RuleBasedValidator::with_default_rules();
        let report = validator.validate_request("IGNORE PREVIOUS INSTRUCTIONS and do X");
        assert!(!report.is_valid);
    }

    #[test]
    fn flagged_pattern_warns_but_passes() {
        let validator = RuleBasedValidator::with_default_rules();
        let report = validator.validate_request("where do I put my API key?");
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn oversized_request_rejected() {
        let validator = RuleBasedValidator::new(SafetyRules {
            max_request_chars: 10,
            ..SafetyRules::default()
        });
        let report = validator.validate_request("this is longer than ten characters");
        assert!(!report.is_valid);
        assert!(report.errors[0].contains("character limit"));
    }

    #[test]
    fn custom_rule_table() {
        let validator = RuleBasedValidator::new(SafetyRules {
            blocked_patterns: vec!["forbidden word".into()],
            flagged_patterns: vec![],
            max_request_chars: 1000,
        });
        assert!(!validator.validate_request("a FORBIDDEN word here").is_valid);
        assert!(validator.validate_request("rm -rf /").is_valid);
    }
}
