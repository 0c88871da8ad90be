//! Error Classifier (C8): maps a raw error string to a tagged kind by
//! matching lowercased substrings in order, then decides retryability from
//! that kind rather than from the raw text again.

use wayfarer_types::error::ErrorKind;

/// Classifies a raw error message into a tagged kind. Order matters: the
/// first matching rule wins, mirroring a `match`-on-substring cascade
/// rather than independent regex tests.
pub fn classify(raw_message: &str) -> ErrorKind {
    let lower = raw_message.to_ascii_lowercase();

    if lower.contains("timeout") {
        ErrorKind::Timeout
    } else if lower.contains("element not found") || lower.contains("no such element") {
        ErrorKind::ElementNotFound
    } else if lower.contains("navigation") && lower.contains("failed") {
        ErrorKind::NavigationFailed
    } else if (lower.contains("page") || lower.contains("browser") || lower.contains("session"))
        && (lower.contains("closed") || lower.contains("crashed"))
    {
        ErrorKind::UpstreamUnavailable
    } else if lower.contains("evaluation") {
        ErrorKind::EvaluationFailed
    } else if lower.contains("file") || lower.contains("upload") {
        ErrorKind::FileFailed
    } else if lower.contains("click") || lower.contains("type") || lower.contains("interact") {
        ErrorKind::InteractionFailed
    } else {
        ErrorKind::Internal
    }
}

const NON_RETRYABLE_SUBSTRINGS: &[&str] = &[
    "page closed",
    "page is closed",
    "browser closed",
    "browser is closed",
    "session closed",
    "session is closed",
    "invalid selector",
    "invalid argument",
    "security error",
    "permission denied",
    "not supported",
];

const RETRYABLE_SUBSTRINGS: &[&str] = &[
    "timeout",
    "network",
    "connection refused",
    "element not found",
    "element not visible",
    "element not interactable",
    "navigation failed",
];

/// Retryability per spec.md's classifier table. This intentionally
/// re-examines the raw message rather than delegating to the coarser
/// `ErrorKind`-based [`CoreError::is_retryable`], since the two tables
/// don't line up one-to-one (a security-flavored message and a
/// `SecurityViolation` kind coincide; a closed-page message doesn't map to
/// any single non-retryable `ErrorKind`). Default is retryable.
pub fn is_retryable(raw_message: &str) -> bool {
    let lower = raw_message.to_ascii_lowercase();
    if NON_RETRYABLE_SUBSTRINGS.iter().any(|p| lower.contains(p)) {
        return false;
    }
    if RETRYABLE_SUBSTRINGS.iter().any(|p| lower.contains(p)) {
        return true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_timeout_before_other_rules() {
        assert_eq!(classify("Navigation timeout of 30000ms exceeded"), ErrorKind::Timeout);
    }

    #[test]
    fn classifies_element_not_found() {
        assert_eq!(classify("Element not found: #missing"), ErrorKind::ElementNotFound);
    }

    #[test]
    fn classifies_page_crashed_as_upstream_unavailable() {
        assert_eq!(classify("Page has crashed"), ErrorKind::UpstreamUnavailable);
    }

    #[test]
    fn security_errors_are_never_retryable() {
        assert!(!is_retryable("security error: dangerous pattern rejected"));
    }

    #[test]
    fn closed_page_is_never_retryable() {
        assert!(!is_retryable("the page is closed"));
    }

    #[test]
    fn unmatched_errors_default_to_retryable() {
        assert!(is_retryable("some unheard-of failure"));
    }
}
