//! Validator chain core: each validator inspects an action and returns
//! errors/warnings; the chain aggregates per `ChainOptions`.

use wayfarer_types::action::Action;

#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationOutcome {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            warnings: vec![],
        }
    }

    pub fn with_warning(message: impl Into<String>) -> Self {
        Self {
            errors: vec![],
            warnings: vec![message.into()],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn merge(&mut self, other: ValidationOutcome) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

pub trait Validator: Send + Sync {
    /// Stable name, matched against `ChainOptions::skip`.
    fn name(&self) -> &'static str;
    fn validate(&self, action: &Action) -> ValidationOutcome;
}

#[derive(Debug, Clone, Default)]
pub struct ChainOptions {
    pub stop_on_first_error: bool,
    pub skip: Vec<String>,
}

pub struct ValidatorChain {
    validators: Vec<Box<dyn Validator>>,
}

impl ValidatorChain {
    pub fn new(validators: Vec<Box<dyn Validator>>) -> Self {
        Self { validators }
    }

    pub fn run(&self, action: &Action, opts: &ChainOptions) -> ValidationOutcome {
        let mut aggregate = ValidationOutcome::ok();
        for validator in &self.validators {
            if opts.skip.iter().any(|s| s == validator.name()) {
                continue;
            }
            let outcome = validator.validate(action);
            let had_error = !outcome.is_valid();
            aggregate.merge(outcome);
            if had_error && opts.stop_on_first_error {
                break;
            }
        }
        aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFails;
    impl Validator for AlwaysFails {
        fn name(&self) -> &'static str {
            "always_fails"
        }
        fn validate(&self, _action: &Action) -> ValidationOutcome {
            ValidationOutcome::with_error("nope")
        }
    }

    struct AlwaysWarns;
    impl Validator for AlwaysWarns {
        fn name(&self) -> &'static str {
            "always_warns"
        }
        fn validate(&self, _action: &Action) -> ValidationOutcome {
            ValidationOutcome::with_warning("hmm")
        }
    }

    #[test]
    fn stop_on_first_error_skips_later_validators() {
        let chain = ValidatorChain::new(vec![Box::new(AlwaysFails), Box::new(AlwaysWarns)]);
        let outcome = chain.run(
            &Action::GetContent,
            &ChainOptions {
                stop_on_first_error: true,
                skip: vec![],
            },
        );
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn skip_list_excludes_named_validators() {
        let chain = ValidatorChain::new(vec![Box::new(AlwaysFails)]);
        let outcome = chain.run(
            &Action::GetContent,
            &ChainOptions {
                stop_on_first_error: false,
                skip: vec!["always_fails".to_string()],
            },
        );
        assert!(outcome.is_valid());
    }
}
