//! XSS / DOM-write pattern detection for scroll/wait/evaluate actions, on
//! top of (not instead of) the plain size/shape checks those validators do.

use crate::validator::{ValidationOutcome, Validator};
use wayfarer_types::action::Action;

const ERROR_PATTERNS: &[&str] = &["<script", "javascript:"];
const WARN_PATTERNS: &[&str] = &["innerHTML", "document.write"];

pub struct ControlFlowValidator;

impl Validator for ControlFlowValidator {
    fn name(&self) -> &'static str {
        "control_flow"
    }

    fn validate(&self, action: &Action) -> ValidationOutcome {
        let body = match action {
            Action::Evaluate { code, .. } => code.as_str(),
            Action::InjectScript { code, .. } => code.as_str(),
            Action::Wait { function_body: Some(body), .. } => body.as_str(),
            _ => return ValidationOutcome::ok(),
        };

        let mut outcome = ValidationOutcome::ok();
        for pattern in ERROR_PATTERNS {
            if body.contains(pattern) {
                outcome.errors.push(format!("disallowed markup/scheme `{pattern}` in script body"));
            }
        }
        if has_inline_event_handler(body) {
            outcome.errors.push("inline event-handler assignment is not permitted".to_string());
        }
        for pattern in WARN_PATTERNS {
            if body.contains(pattern) {
                outcome.warnings.push(format!("use of `{pattern}` can enable DOM-based XSS"));
            }
        }
        outcome
    }
}

fn has_inline_event_handler(body: &str) -> bool {
    const HANDLERS: &[&str] = &["onclick", "onerror", "onload", "onmouseover"];
    HANDLERS.iter().any(|h| body.contains(&format!("{h} =")) || body.contains(&format!("{h}=")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_script_tag_injection() {
        let v = ControlFlowValidator;
        let action = Action::InjectScript { code: "<script>alert(1)</script>".into(), timeout_ms: 1000 };
        assert!(!v.validate(&action).is_valid());
    }

    #[test]
    fn warns_on_inner_html_without_blocking() {
        let v = ControlFlowValidator;
        let action = Action::Evaluate {
            code: "el.innerHTML = data".into(),
            args: vec![],
            timeout_ms: 1000,
            return_by_value: true,
        };
        let outcome = v.validate(&action);
        assert!(outcome.is_valid());
        assert_eq!(outcome.warnings.len(), 1);
    }
}
