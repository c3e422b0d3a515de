//! Response sanitization.
//!
//! Strips control characters that could corrupt a terminal or editor
//! rendering, and redacts strings that look like leaked API keys.

/// Sanitize response text before it reaches the user.
pub fn sanitize_text(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect();

    redact_key_material(&stripped)
}

/// Replace `sk-`-prefixed tokens of plausible key length with a marker.
fn redact_key_material(text: &str) -> String {
    const PREFIX: &str = "sk-";
    const MIN_KEY_BODY: usize = 20;

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find(PREFIX) {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + PREFIX.len()..];
        let body_len = after
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .count();

        if body_len >= MIN_KEY_BODY {
            out.push_str("[REDACTED]");
            rest = &after[body_len..];
        } else {
            out.push_str(PREFIX);
            rest = after;
        }
    }
    out.push_str(rest);
    out
}
