use crate::validators::evaluation::contains_dangerous_js;
use crate::validator::{ValidationOutcome, Validator};
use wayfarer_types::action::{Action, WaitKind};

const MAX_WAIT_MS: u64 = 300_000;

pub struct WaitValidator;

impl Validator for WaitValidator {
    fn name(&self) -> &'static str {
        "wait"
    }

    fn validate(&self, action: &Action) -> ValidationOutcome {
        let Action::Wait { kind, selector, visible, hidden, function_body, timeout_ms, .. } = action else {
            return ValidationOutcome::ok();
        };

        if *timeout_ms > MAX_WAIT_MS {
            return ValidationOutcome::with_error(format!(
                "wait: timeout_ms {timeout_ms} exceeds the {MAX_WAIT_MS}ms ceiling"
            ));
        }

        match kind {
            WaitKind::Selector => {
                if selector.as_deref().unwrap_or("").is_empty() {
                    return ValidationOutcome::with_error("wait(selector): selector must be present");
                }
                if visible.is_some() && hidden.is_some() {
                    return ValidationOutcome::with_error(
                        "wait(selector): visible and hidden are mutually exclusive",
                    );
                }
            }
            WaitKind::Function => {
                let Some(body) = function_body else {
                    return ValidationOutcome::with_error("wait(function): function_body is required");
                };
                if let Some(reason) = contains_dangerous_js(body) {
                    return ValidationOutcome::with_error(format!("wait(function): {reason}"));
                }
            }
            WaitKind::Navigation | WaitKind::Timeout => {}
        }

        ValidationOutcome::ok()
    }
}
