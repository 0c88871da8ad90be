use chrono::Utc;
use std::time::Duration;
use wayfarer_types::action::{Action, ActionResult};
use wayfarer_types::error::CoreResult;
use wayfarer_types::ports::BrowserPage;

pub async fn execute(action: &Action, page: &dyn BrowserPage) -> CoreResult<ActionResult> {
    let start = Utc::now();
    match action {
        Action::Navigate { url, wait_until, timeout_ms } => {
            let outcome = page.goto(url, super::to_port_wait(*wait_until), Duration::from_millis(*timeout_ms)).await?;
            let result = ActionResult::ok(
                "navigate",
                start,
                serde_json::json!({
                    "final_url": outcome.final_url,
                    "status_code": outcome.status_code,
                    "title": outcome.title,
                }),
            )
            .with_metadata("waitUntil", serde_json::json!(super::wait_until_label(*wait_until)));
            Ok(result)
        }
        Action::GoBack { timeout_ms } => {
            let went = page.go_back(Duration::from_millis(*timeout_ms)).await?;
            let mut result = ActionResult::ok("goBack", start, serde_json::json!({ "navigated": went }));
            if !went {
                result = result.with_metadata("reason", serde_json::json!("history length <= 1"));
            }
            Ok(result)
        }
        Action::GoForward { timeout_ms } => {
            let went = page.go_forward(Duration::from_millis(*timeout_ms)).await?;
            let mut result = ActionResult::ok("goForward", start, serde_json::json!({ "navigated": went }));
            if !went {
                result = result.with_metadata("reason", serde_json::json!("history length <= 1"));
            }
            Ok(result)
        }
        Action::Refresh { timeout_ms } => {
            let outcome = page.reload(Duration::from_millis(*timeout_ms)).await?;
            Ok(ActionResult::ok(
                "refresh",
                start,
                serde_json::json!({ "final_url": outcome.final_url, "status_code": outcome.status_code }),
            ))
        }
        Action::SetViewport { width, height, scale } => {
            let (w, h) = page.set_viewport(*width, *height, *scale).await?;
            Ok(ActionResult::ok("setViewport", start, serde_json::json!({ "width": w, "height": h })))
        }
        _ => unreachable!("navigation executor invoked with a non-navigation action"),
    }
}
