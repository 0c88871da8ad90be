//! Page lifecycle on top of a checked-out browser (spec.md C4): creating and
//! closing pages within a session's context, enforcing the per-browser page
//! cap so one context can't starve the rest of the pool.

use crate::pool::BrowserCheckout;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use wayfarer_types::error::{CoreError, CoreResult};
use wayfarer_types::ports::BrowserPage;

/// Tracks which pages belong to which checkout so `close_page`/`close_all`
/// can tear down without the caller having to remember handles itself.
pub struct PageManager {
    max_pages_per_browser: u32,
    pages: RwLock<HashMap<String, Arc<dyn BrowserPage>>>,
}

impl PageManager {
    pub fn new(max_pages_per_browser: u32) -> Self {
        Self {
            max_pages_per_browser,
            pages: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_page(
        &self,
        page_id: &str,
        checkout: &BrowserCheckout,
    ) -> CoreResult<Arc<dyn BrowserPage>> {
        let count = self.pages.read().await.len() as u32;
        if count >= self.max_pages_per_browser {
            return Err(CoreError::resource_exhausted(format!(
                "browser {} already has {} pages, at capacity {}",
                checkout.browser_id(),
                count,
                self.max_pages_per_browser
            )));
        }

        let page = checkout.new_page().await?;
        self.pages.write().await.insert(page_id.to_string(), page.clone());
        debug!(page_id, browser_id = checkout.browser_id(), "page created");
        Ok(page)
    }

    pub async fn get_page(&self, page_id: &str) -> CoreResult<Arc<dyn BrowserPage>> {
        self.pages
            .read()
            .await
            .get(page_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("no page tracked for id {page_id}")))
    }

    pub async fn close_page(&self, page_id: &str) -> CoreResult<()> {
        let page = self.pages.write().await.remove(page_id);
        match page {
            Some(page) => {
                page.close().await?;
                debug!(page_id, "page closed");
                Ok(())
            }
            None => {
                warn!(page_id, "close_page called for untracked page");
                Ok(())
            }
        }
    }

    pub async fn page_count(&self) -> usize {
        self.pages.read().await.len()
    }

    pub async fn close_all(&self) {
        let mut pages = self.pages.write().await;
        for (page_id, page) in pages.drain() {
            if let Err(e) = page.close().await {
                warn!(page_id, error = %e, "error closing page during teardown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let mgr = PageManager::new(5);
        assert_eq!(mgr.max_pages_per_browser, 5);
    }
}
