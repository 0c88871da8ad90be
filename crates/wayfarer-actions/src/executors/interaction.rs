use chrono::Utc;
use std::time::Duration;
use wayfarer_types::action::{Action, ActionResult, ScrollDirection};
use wayfarer_types::error::CoreResult;
use wayfarer_types::ports::engine::ScrollSpec;
use wayfarer_types::ports::BrowserPage;

pub async fn execute(action: &Action, page: &dyn BrowserPage) -> CoreResult<ActionResult> {
    let start = Utc::now();
    match action {
        Action::Click { selector, wait_for_selector, timeout_ms } => {
            page.click(selector, *wait_for_selector, Duration::from_millis(*timeout_ms)).await?;
            Ok(ActionResult::ok("click", start, serde_json::json!({ "selector": selector })))
        }
        Action::Type { selector, text, clear_first, timeout_ms } => {
            page.type_text(selector, text, *clear_first, Duration::from_millis(*timeout_ms)).await?;
            Ok(ActionResult::ok("type", start, serde_json::json!({ "selector": selector, "length": text.len() })))
        }
        Action::Scroll { selector, x, y, direction, smooth } => {
            let spec = ScrollSpec {
                selector: selector.clone(),
                x: *x,
                y: *y,
                direction: direction.map(direction_str),
                smooth: *smooth,
            };
            page.scroll(spec, Duration::from_secs(30)).await?;
            Ok(ActionResult::ok("scroll", start, serde_json::json!({})))
        }
        _ => unreachable!("interaction executor invoked with a non-interaction action"),
    }
}

fn direction_str(d: ScrollDirection) -> &'static str {
    match d {
        ScrollDirection::Up => "up",
        ScrollDirection::Down => "down",
        ScrollDirection::Left => "left",
        ScrollDirection::Right => "right",
    }
}
