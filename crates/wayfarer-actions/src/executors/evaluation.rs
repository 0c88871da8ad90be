use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use wayfarer_types::action::{Action, ActionResult};
use wayfarer_types::error::CoreResult;
use wayfarer_types::ports::{BrowserPage, HandleTable};

const MAX_RESULT_BYTES: usize = 100 * 1024;

pub async fn execute(
    action: &Action,
    page: &dyn BrowserPage,
    handles: &Arc<dyn HandleTable>,
    session_id: &str,
) -> CoreResult<ActionResult> {
    let start = Utc::now();
    match action {
        Action::Evaluate { code, args, timeout_ms, .. } => {
            let value = page.evaluate(code, args, Duration::from_millis(*timeout_ms)).await?;
            let (value, truncated) = truncate_if_needed(value);
            let mut result = ActionResult::ok("evaluate", start, value);
            if truncated {
                result = result.with_metadata("truncated", serde_json::json!(true));
            }
            Ok(result)
        }
        Action::EvaluateHandle { code, args, timeout_ms } => {
            let raw_value = page.evaluate(code, args, Duration::from_millis(*timeout_ms)).await?;
            let handle_id = handles.store(session_id, raw_value).await;
            Ok(ActionResult::ok("evaluateHandle", start, serde_json::json!({ "handle_id": handle_id })))
        }
        Action::InjectScript { code, timeout_ms } => {
            page.inject_script(code, Duration::from_millis(*timeout_ms)).await?;
            Ok(ActionResult::ok("injectScript", start, serde_json::json!({})))
        }
        Action::InjectCss { code, timeout_ms } => {
            page.inject_css(code, Duration::from_millis(*timeout_ms)).await?;
            Ok(ActionResult::ok("injectCSS", start, serde_json::json!({})))
        }
        _ => unreachable!("evaluation executor invoked with a non-evaluation action"),
    }
}

fn truncate_if_needed(value: serde_json::Value) -> (serde_json::Value, bool) {
    let encoded = serde_json::to_vec(&value).unwrap_or_default();
    if encoded.len() <= MAX_RESULT_BYTES {
        return (value, false);
    }
    let truncated_text = String::from_utf8_lossy(&encoded[..MAX_RESULT_BYTES]).into_owned();
    (serde_json::json!({ "truncated_preview": truncated_text }), true)
}
