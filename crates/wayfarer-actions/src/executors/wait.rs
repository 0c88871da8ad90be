use chrono::Utc;
use std::time::Duration;
use wayfarer_types::action::{Action, ActionResult, WaitKind};
use wayfarer_types::error::CoreResult;
use wayfarer_types::ports::BrowserPage;

pub async fn execute(action: &Action, page: &dyn BrowserPage) -> CoreResult<ActionResult> {
    let Action::Wait { kind, selector, visible, hidden, wait_until, timeout_ms, function_body } = action else {
        unreachable!("wait executor invoked with a non-wait action");
    };
    let start = Utc::now();
    let timeout = Duration::from_millis(*timeout_ms);

    match kind {
        WaitKind::Selector => {
            let selector = selector.as_deref().unwrap_or_default();
            page.wait_for_selector(selector, *visible, *hidden, timeout).await?;
            Ok(ActionResult::ok("wait", start, serde_json::json!({ "kind": "selector", "selector": selector })))
        }
        WaitKind::Navigation => {
            let wait_until = super::to_port_wait(wait_until.unwrap_or(wayfarer_types::action::WaitUntil::Load));
            page.wait_for_navigation(wait_until, timeout).await?;
            Ok(ActionResult::ok("wait", start, serde_json::json!({ "kind": "navigation" })))
        }
        WaitKind::Timeout => {
            tokio::time::sleep(timeout).await;
            Ok(ActionResult::ok("wait", start, serde_json::json!({ "kind": "timeout", "waited_ms": timeout_ms })))
        }
        WaitKind::Function => {
            let body = function_body.as_deref().unwrap_or_default();
            page.wait_for_function(body, timeout).await?;
            Ok(ActionResult::ok("wait", start, serde_json::json!({ "kind": "function" })))
        }
    }
}
