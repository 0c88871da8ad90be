use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use wayfarer_types::action::{Action, ActionResult, CookieOp};
use wayfarer_types::error::{CoreError, CoreResult};
use wayfarer_types::ports::engine::CookieSpec;
use wayfarer_types::ports::BrowserPage;

const DOWNLOAD_POLL_INTERVAL: Duration = Duration::from_millis(200);
const DOWNLOAD_POLL_CAP: u32 = 150; // 30s at 200ms

pub async fn execute(
    action: &Action,
    page: &dyn BrowserPage,
    sandbox_root: &Path,
) -> CoreResult<ActionResult> {
    let start = Utc::now();
    match action {
        Action::Upload { selector, files } => {
            let resolved: Vec<String> = files
                .iter()
                .map(|f| sandboxed_path(sandbox_root, f))
                .collect::<CoreResult<Vec<_>>>()?
                .into_iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            page.upload_files(selector, &resolved).await?;
            Ok(ActionResult::ok("upload", start, serde_json::json!({ "files": resolved })))
        }
        Action::Download { url, path, wait_for_download, timeout_ms } => {
            let target = sandboxed_path(sandbox_root, path)?;
            page.set_download_behavior(&sandbox_root.to_string_lossy()).await?;
            page.goto(
                url,
                wayfarer_types::ports::engine::WaitUntil::Load,
                Duration::from_millis(*timeout_ms),
            )
            .await?;

            if *wait_for_download {
                let mut waited = 0u32;
                while !target.exists() {
                    if waited >= DOWNLOAD_POLL_CAP {
                        return Err(CoreError::timeout(format!(
                            "download of {url} did not appear at {} within the poll cap",
                            target.display()
                        )));
                    }
                    sleep(DOWNLOAD_POLL_INTERVAL).await;
                    waited += 1;
                }
            }
            Ok(ActionResult::ok("download", start, serde_json::json!({ "path": target.to_string_lossy() })))
        }
        Action::Cookie { op, name, value, domain } => execute_cookie(page, start, *op, name, value, domain).await,
        _ => unreachable!("file executor invoked with a non-file action"),
    }
}

async fn execute_cookie(
    page: &dyn BrowserPage,
    start: chrono::DateTime<Utc>,
    op: CookieOp,
    name: &Option<String>,
    value: &Option<String>,
    domain: &Option<String>,
) -> CoreResult<ActionResult> {
    match op {
        CookieOp::Get => {
            let cookies = page.get_cookies().await?;
            let json = cookies
                .into_iter()
                .map(|c| serde_json::json!({ "name": c.name, "value": c.value, "domain": c.domain }))
                .collect::<Vec<_>>();
            Ok(ActionResult::ok("cookie", start, serde_json::json!({ "op": "get", "cookies": json })))
        }
        CookieOp::Set => {
            let name = name.clone().ok_or_else(|| CoreError::invalid_input("cookie set requires name"))?;
            let value = value.clone().ok_or_else(|| CoreError::invalid_input("cookie set requires value"))?;
            page.set_cookie(CookieSpec { name: name.clone(), value, domain: domain.clone() }).await?;
            Ok(ActionResult::ok("cookie", start, serde_json::json!({ "op": "set", "name": name })))
        }
        CookieOp::Delete => {
            let name = name.clone().ok_or_else(|| CoreError::invalid_input("cookie delete requires name"))?;
            page.delete_cookie(&name).await?;
            Ok(ActionResult::ok("cookie", start, serde_json::json!({ "op": "delete", "name": name })))
        }
    }
}

/// Resolves `relative` against `sandbox_root`, rejecting any path that
/// escapes it (parent components, absolute paths).
fn sandboxed_path(sandbox_root: &Path, relative: &str) -> CoreResult<PathBuf> {
    let candidate = Path::new(relative);
    if candidate.components().any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))) {
        return Err(CoreError::security_violation(format!(
            "path {relative} escapes the session sandbox"
        )));
    }
    Ok(sandbox_root.join(candidate))
}
