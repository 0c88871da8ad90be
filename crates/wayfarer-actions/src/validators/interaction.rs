use crate::validator::{ValidationOutcome, Validator};
use wayfarer_types::action::Action;

pub struct InteractionValidator;

impl Validator for InteractionValidator {
    fn name(&self) -> &'static str {
        "interaction"
    }

    fn validate(&self, action: &Action) -> ValidationOutcome {
        match action {
            Action::Click { selector, .. } | Action::Type { selector, .. } => {
                if selector.trim().is_empty() {
                    ValidationOutcome::with_error(format!("{}: selector must not be empty", action.type_name()))
                } else {
                    ValidationOutcome::ok()
                }
            }
            Action::Scroll { selector, x, y, direction, .. } => {
                if selector.is_none() && x.is_none() && y.is_none() && direction.is_none() {
                    return ValidationOutcome::with_error(
                        "scroll: must specify a selector, coordinates, or a direction",
                    );
                }
                if let (Some(x), Some(y)) = (x, y) {
                    if *x < 0 || *y < 0 {
                        return ValidationOutcome::with_error("scroll: coordinates must be non-negative");
                    }
                }
                ValidationOutcome::ok()
            }
            _ => ValidationOutcome::ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_click_selector() {
        let v = InteractionValidator;
        let action = Action::Click { selector: "".into(), wait_for_selector: true, timeout_ms: 1000 };
        assert!(!v.validate(&action).is_valid());
    }

    #[test]
    fn rejects_negative_scroll_coordinates() {
        let v = InteractionValidator;
        let action = Action::Scroll { selector: None, x: Some(-1), y: Some(0), direction: None, smooth: false };
        assert!(!v.validate(&action).is_valid());
    }

    #[test]
    fn scroll_with_direction_only_is_valid() {
        let v = InteractionValidator;
        let action = Action::Scroll {
            selector: None,
            x: None,
            y: None,
            direction: Some(wayfarer_types::action::ScrollDirection::Down),
            smooth: true,
        };
        assert!(v.validate(&action).is_valid());
    }
}
