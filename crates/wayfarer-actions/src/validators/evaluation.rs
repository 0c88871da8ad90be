//! Evaluation security checks: size caps, argument limits, and rejection of
//! patterns that would let injected code escape the sandbox the executor
//! thinks it's running in.

use crate::validator::{ValidationOutcome, Validator};
use wayfarer_types::action::Action;

const MAX_JS_BYTES: usize = 50 * 1024;
const MAX_CSS_BYTES: usize = 100 * 1024;
const MAX_ARGS: usize = 10;
const MAX_ARG_BYTES: usize = 10 * 1024;

const DANGEROUS_JS_PATTERNS: &[&str] = &[
    "eval(",
    "Function(",
    "setTimeout(",
    "setInterval(",
    "import(",
    "require(",
    "XMLHttpRequest",
    "fetch(",
    "__proto__",
    "process.",
    "globalThis",
];

const DANGEROUS_CSS_PATTERNS: &[&str] = &[
    "javascript:",
    "expression(",
    "behavior:",
    "binding:",
    "data:text/javascript",
];

/// Returns the first reason the body should be rejected, if any.
pub fn contains_dangerous_js(body: &str) -> Option<String> {
    for pattern in DANGEROUS_JS_PATTERNS {
        if body.contains(pattern) {
            return Some(format!("contains disallowed construct `{pattern}`"));
        }
    }
    if body.contains("constructor") && body.contains("prototype") {
        return Some("prototype-chain walking is not permitted".to_string());
    }
    if let Some(ch) = body.chars().find(|c| is_suspicious_unicode(*c)) {
        return Some(format!("contains suspicious unicode codepoint U+{:04X}", ch as u32));
    }
    None
}

fn contains_dangerous_css(body: &str) -> Option<String> {
    let lower = body.to_ascii_lowercase();
    DANGEROUS_CSS_PATTERNS
        .iter()
        .find(|p| lower.contains(*p))
        .map(|p| format!("contains disallowed construct `{p}`"))
}

fn is_suspicious_unicode(c: char) -> bool {
    matches!(
        c as u32,
        0x200B..=0x200F | 0x202A..=0x202E | 0xFEFF
    )
}

pub struct EvaluationValidator;

impl Validator for EvaluationValidator {
    fn name(&self) -> &'static str {
        "evaluation"
    }

    fn validate(&self, action: &Action) -> ValidationOutcome {
        match action {
            Action::Evaluate { code, args, .. } | Action::EvaluateHandle { code, args, .. } => {
                let mut outcome = check_js(code);
                if args.len() > MAX_ARGS {
                    outcome.errors.push(format!(
                        "evaluate: at most {MAX_ARGS} arguments are permitted, got {}",
                        args.len()
                    ));
                }
                for (i, arg) in args.iter().enumerate() {
                    let bytes = serde_json::to_vec(arg).map(|v| v.len()).unwrap_or(0);
                    if bytes > MAX_ARG_BYTES {
                        outcome.errors.push(format!("evaluate: argument {i} exceeds {MAX_ARG_BYTES} bytes"));
                    }
                }
                outcome
            }
            Action::InjectScript { code, .. } => check_js(code),
            Action::InjectCss { code, .. } => check_css(code),
            _ => ValidationOutcome::ok(),
        }
    }
}

fn check_js(code: &str) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::ok();
    if code.len() > MAX_JS_BYTES {
        outcome.errors.push(format!("script exceeds {MAX_JS_BYTES} byte cap"));
    }
    if let Some(reason) = contains_dangerous_js(code) {
        outcome.errors.push(reason);
    }
    outcome
}

fn check_css(code: &str) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::ok();
    if code.len() > MAX_CSS_BYTES {
        outcome.errors.push(format!("stylesheet exceeds {MAX_CSS_BYTES} byte cap"));
    }
    if let Some(reason) = contains_dangerous_css(code) {
        outcome.errors.push(reason);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_eval() {
        let v = EvaluationValidator;
        let action = Action::Evaluate { code: "eval('1+1')".into(), args: vec![], timeout_ms: 1000, return_by_value: true };
        assert!(!v.validate(&action).is_valid());
    }

    #[test]
    fn rejects_too_many_args() {
        let v = EvaluationValidator;
        let args = vec![serde_json::json!(1); 11];
        let action = Action::Evaluate { code: "1+1".into(), args, timeout_ms: 1000, return_by_value: true };
        assert!(!v.validate(&action).is_valid());
    }

    #[test]
    fn rejects_css_expression_injection() {
        let v = EvaluationValidator;
        let action = Action::InjectCss { code: "body { width: expression(alert(1)); }".into(), timeout_ms: 1000 };
        assert!(!v.validate(&action).is_valid());
    }

    #[test]
    fn allows_plain_arithmetic() {
        let v = EvaluationValidator;
        let action = Action::Evaluate { code: "1 + 1".into(), args: vec![], timeout_ms: 1000, return_by_value: true };
        assert!(v.validate(&action).is_valid());
    }
}
