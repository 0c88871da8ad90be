use crate::validator::{ValidationOutcome, Validator};
use wayfarer_types::action::Action;

pub struct NavigationValidator {
    pub host_block_list: Vec<String>,
    pub allow_file_scheme: bool,
}

impl Validator for NavigationValidator {
    fn name(&self) -> &'static str {
        "navigation"
    }

    fn validate(&self, action: &Action) -> ValidationOutcome {
        let Action::Navigate { url, .. } = action else {
            return ValidationOutcome::ok();
        };

        if url.is_empty() {
            return ValidationOutcome::with_error("navigate: url must not be empty");
        }

        let scheme = url.split_once("://").map(|(s, _)| s.to_ascii_lowercase());
        let allowed = match scheme.as_deref() {
            Some("http") | Some("https") | Some("about") => true,
            Some("file") => self.allow_file_scheme,
            _ => false,
        };
        if !allowed {
            return ValidationOutcome::with_error(format!(
                "navigate: scheme not permitted in {url}"
            ));
        }

        if let Some(host) = extract_host(url) {
            if self.host_block_list.iter().any(|blocked| blocked == &host) {
                return ValidationOutcome::with_error(format!("navigate: host {host} is blocked"));
            }
        }

        ValidationOutcome::ok()
    }
}

fn extract_host(url: &str) -> Option<String> {
    let rest = url.split_once("://")?.1;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit_once('@').map(|(_, h)| h).unwrap_or(authority);
    Some(host.rsplit_once(':').map(|(h, _)| h).unwrap_or(host).to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_types::action::WaitUntil;

    fn navigate(url: &str) -> Action {
        Action::Navigate {
            url: url.to_string(),
            wait_until: WaitUntil::Load,
            timeout_ms: 1000,
        }
    }

    #[test]
    fn rejects_javascript_scheme() {
        let v = NavigationValidator { host_block_list: vec![], allow_file_scheme: false };
        assert!(!v.validate(&navigate("javascript:alert(1)")).is_valid());
    }

    #[test]
    fn rejects_blocked_host() {
        let v = NavigationValidator {
            host_block_list: vec!["evil.example".to_string()],
            allow_file_scheme: false,
        };
        assert!(!v.validate(&navigate("https://evil.example/path")).is_valid());
    }

    #[test]
    fn allows_plain_https() {
        let v = NavigationValidator { host_block_list: vec![], allow_file_scheme: false };
        assert!(v.validate(&navigate("https://example.com")).is_valid());
    }
}
