use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use wayfarer_types::action::{Action, ActionResult};
use wayfarer_types::error::CoreResult;
use wayfarer_types::ports::engine::{PdfOpts, ScreenshotOpts};
use wayfarer_types::ports::BrowserPage;

pub async fn execute(action: &Action, page: &dyn BrowserPage) -> CoreResult<ActionResult> {
    let start = Utc::now();
    match action {
        Action::Screenshot { format, quality, clip, full_page, selector } => {
            let opts = ScreenshotOpts {
                format: Some(*format),
                quality: *quality,
                clip: clip.as_ref().map(|c| (c.x, c.y, c.width, c.height)),
                full_page: *full_page,
                selector: selector.clone(),
            };
            let bytes = page.screenshot(opts).await?;
            Ok(ActionResult::ok(
                "screenshot",
                start,
                serde_json::json!({
                    "data_base64": BASE64.encode(&bytes),
                    "content_type": content_type_for(*format),
                    "bytes": bytes.len(),
                }),
            ))
        }
        Action::Pdf { format, landscape, scale, margins, page_ranges, header_template, footer_template } => {
            let opts = PdfOpts {
                format: *format,
                landscape: *landscape,
                scale: *scale,
                margins: margins.clone(),
                page_ranges: page_ranges.clone(),
                header_template: header_template.clone(),
                footer_template: footer_template.clone(),
            };
            let bytes = page.pdf(opts).await?;
            Ok(ActionResult::ok(
                "pdf",
                start,
                serde_json::json!({
                    "data_base64": BASE64.encode(&bytes),
                    "content_type": "application/pdf",
                    "bytes": bytes.len(),
                }),
            ))
        }
        Action::GetContent => {
            let html = page.get_content().await?;
            Ok(ActionResult::ok("getContent", start, serde_json::json!({ "html": html })))
        }
        Action::GetCookies => {
            let cookies = page.get_cookies().await?;
            let json = cookies
                .into_iter()
                .map(|c| serde_json::json!({ "name": c.name, "value": c.value, "domain": c.domain }))
                .collect::<Vec<_>>();
            Ok(ActionResult::ok("getCookies", start, serde_json::json!({ "cookies": json })))
        }
        Action::GetTitle => {
            let title = page.get_title().await?;
            Ok(ActionResult::ok("getTitle", start, serde_json::json!({ "title": title })))
        }
        Action::GetUrl => {
            let url = page.get_url().await?;
            Ok(ActionResult::ok("getUrl", start, serde_json::json!({ "url": url })))
        }
        _ => unreachable!("extraction executor invoked with a non-extraction action"),
    }
}

fn content_type_for(format: wayfarer_types::action::ScreenshotFormat) -> &'static str {
    use wayfarer_types::action::ScreenshotFormat as F;
    match format {
        F::Png => "image/png",
        F::Jpeg => "image/jpeg",
        F::Webp => "image/webp",
    }
}
