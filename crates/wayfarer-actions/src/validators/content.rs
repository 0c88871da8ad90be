use crate::validator::{ValidationOutcome, Validator};
use once_cell::sync::Lazy;
use regex::Regex;
use wayfarer_types::action::{Action, PdfMargins, ScreenshotFormat};

static PAGE_RANGES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(-\d+)?)(,\d+(-\d+)?)*$").unwrap());
static CSS_UNIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?(px|in|cm|mm|pt|pc)?$").unwrap());

pub struct ContentValidator;

impl Validator for ContentValidator {
    fn name(&self) -> &'static str {
        "content"
    }

    fn validate(&self, action: &Action) -> ValidationOutcome {
        match action {
            Action::Screenshot { format, quality, clip, .. } => {
                let mut outcome = ValidationOutcome::ok();
                if let Some(q) = quality {
                    if !matches!(format, ScreenshotFormat::Jpeg) {
                        outcome.warnings.push("quality is only honored for jpeg screenshots".to_string());
                    }
                    if *q > 100 {
                        outcome.errors.push("screenshot: quality must be 0..=100".to_string());
                    }
                }
                if let Some(clip) = clip {
                    if clip.width < 0 || clip.height < 0 {
                        outcome.errors.push("screenshot: clip dimensions must be non-negative".to_string());
                    }
                }
                outcome
            }
            Action::Pdf { scale, margins, page_ranges, .. } => {
                let mut outcome = ValidationOutcome::ok();
                if !(0.1..=2.0).contains(scale) {
                    outcome.errors.push("pdf: scale must be between 0.1 and 2.0".to_string());
                }
                if let Some(reason) = invalid_margin(margins) {
                    outcome.errors.push(reason);
                }
                if let Some(ranges) = page_ranges {
                    if !PAGE_RANGES.is_match(ranges) {
                        outcome.errors.push(format!("pdf: page_ranges {ranges} is not valid"));
                    }
                }
                outcome
            }
            _ => ValidationOutcome::ok(),
        }
    }
}

fn invalid_margin(margins: &PdfMargins) -> Option<String> {
    for (name, value) in [
        ("top", &margins.top),
        ("right", &margins.right),
        ("bottom", &margins.bottom),
        ("left", &margins.left),
    ] {
        if !CSS_UNIT.is_match(value) {
            return Some(format!("pdf: margin.{name} = {value:?} is not a valid CSS length"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn margins(v: &str) -> PdfMargins {
        PdfMargins { top: v.into(), right: v.into(), bottom: v.into(), left: v.into() }
    }

    #[test]
    fn rejects_out_of_range_jpeg_quality() {
        let v = ContentValidator;
        let action = Action::Screenshot {
            format: ScreenshotFormat::Jpeg,
            quality: Some(150),
            clip: None,
            full_page: false,
            selector: None,
        };
        assert!(!v.validate(&action).is_valid());
    }

    #[test]
    fn rejects_malformed_page_ranges() {
        let v = ContentValidator;
        let action = Action::Pdf {
            format: wayfarer_types::action::PdfFormat::A4,
            landscape: false,
            scale: 1.0,
            margins: margins("1cm"),
            page_ranges: Some("1-3,,7".into()),
            header_template: None,
            footer_template: None,
        };
        assert!(!v.validate(&action).is_valid());
    }

    #[test]
    fn accepts_valid_pdf_request() {
        let v = ContentValidator;
        let action = Action::Pdf {
            format: wayfarer_types::action::PdfFormat::A4,
            landscape: false,
            scale: 1.0,
            margins: margins("1cm"),
            page_ranges: Some("1-3,5".into()),
            header_template: None,
            footer_template: None,
        };
        assert!(v.validate(&action).is_valid());
    }
}
