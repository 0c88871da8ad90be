//! Action Executor (C7): dispatches an action to the strategy that owns its
//! family, sharing the contract `execute(action, page, ctx) -> ActionResult`.

use crate::executors::{evaluation, extraction, file, interaction, navigation, wait};
use std::path::PathBuf;
use std::sync::Arc;
use wayfarer_types::action::{Action, ActionResult};
use wayfarer_types::error::CoreResult;
use wayfarer_types::ports::{BrowserPage, HandleTable};

pub struct ActionExecutor {
    pub handles: Arc<dyn HandleTable>,
    pub sandbox_root: PathBuf,
}

impl ActionExecutor {
    pub fn new(handles: Arc<dyn HandleTable>, sandbox_root: PathBuf) -> Self {
        Self { handles, sandbox_root }
    }

    pub async fn execute(
        &self,
        action: &Action,
        page: &dyn BrowserPage,
        session_id: &str,
    ) -> CoreResult<ActionResult> {
        match action {
            Action::Navigate { .. }
            | Action::GoBack { .. }
            | Action::GoForward { .. }
            | Action::Refresh { .. }
            | Action::SetViewport { .. } => navigation::execute(action, page).await,

            Action::Click { .. } | Action::Type { .. } | Action::Scroll { .. } => {
                interaction::execute(action, page).await
            }

            Action::Wait { .. } => wait::execute(action, page).await,

            Action::Evaluate { .. }
            | Action::EvaluateHandle { .. }
            | Action::InjectScript { .. }
            | Action::InjectCss { .. } => evaluation::execute(action, page, &self.handles, session_id).await,

            Action::Screenshot { .. }
            | Action::Pdf { .. }
            | Action::GetContent
            | Action::GetCookies
            | Action::GetTitle
            | Action::GetUrl => extraction::execute(action, page).await,

            Action::Upload { .. } | Action::Download { .. } | Action::Cookie { .. } => {
                file::execute(action, page, &self.sandbox_root).await
            }
        }
    }
}
