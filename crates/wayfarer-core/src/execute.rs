//! The hot path: resolve (session, context, page) → validate → run through
//! a circuit breaker and retry policy → classify and audit (spec.md §2's
//! documented data flow).

use crate::plane::{ContextLease, ControlPlane};
use chrono::Utc;
use tracing::warn;
use wayfarer_actions::ChainOptions;
use wayfarer_types::action::{Action, ActionResult};
use wayfarer_types::error::{CoreError, CoreResult};
use wayfarer_types::model::{ContextStatus, Page};
use wayfarer_types::ports::{
    AuditEvent, AuditSink, CircuitBreaker, CircuitBreakerRegistry, ProxyManager, ProxyRotationReason,
    SessionBackend,
};

impl ControlPlane {
    /// Returns the context's browser id and, if one is assigned, its proxy
    /// id. Assigning a proxy is best-effort: a context whose proxy pool is
    /// empty still gets a browser lease.
    async fn ensure_lease(&self, context_id: &str) -> CoreResult<(String, Option<String>)> {
        if let Some(lease) = self.leases.read().await.get(context_id) {
            return Ok((lease.checkout.browser_id().to_string(), lease.proxy_id.clone()));
        }
        let checkout = self.pool.checkout().await?;
        let browser_id = checkout.browser_id().to_string();
        let proxy_id = self.proxy.assign(context_id).await.ok().map(|p| p.id);
        self.leases.write().await.insert(
            context_id.to_string(),
            ContextLease { checkout, page_ids: vec![], proxy_id: proxy_id.clone() },
        );
        Ok((browser_id, proxy_id))
    }

    pub(crate) async fn release_context_lease(&self, context_id: &str) {
        let lease = self.leases.write().await.remove(context_id);
        if let Some(lease) = lease {
            for page_id in &lease.page_ids {
                let _ = self.page_manager.close_page(page_id).await;
            }
            if let Err(e) = lease.checkout.checkin().await {
                warn!(context_id, error = %e, "failed to check browser back in on context release");
            }
        }
    }

    /// Opens a new tab within a context, acquiring a browser lease for the
    /// context on its first page (spec.md §4.4).
    pub async fn open_page(&self, context_id: &str, url: &str) -> CoreResult<Page> {
        let context = self.store.get_context(context_id).await?;
        if context.status != ContextStatus::Active {
            return Err(CoreError::conflict(format!("context {context_id} is closed")));
        }

        self.ensure_lease(context_id).await?;
        let page_record = self.store.create_page(context_id, url).await?;

        let created = {
            let leases = self.leases.read().await;
            let lease = leases
                .get(context_id)
                .ok_or_else(|| CoreError::internal("lease vanished after ensure_lease"))?;
            self.page_manager.create_page(&page_record.id, &lease.checkout).await
        };
        if let Err(e) = created {
            self.store.close_page(&page_record.id).await.ok();
            return Err(e);
        }

        if let Some(lease) = self.leases.write().await.get_mut(context_id) {
            lease.page_ids.push(page_record.id.clone());
        }
        Ok(page_record)
    }

    pub async fn close_page(&self, context_id: &str, page_id: &str) -> CoreResult<()> {
        self.page_manager.close_page(page_id).await?;
        if let Some(lease) = self.leases.write().await.get_mut(context_id) {
            lease.page_ids.retain(|id| id != page_id);
        }
        self.store.close_page(page_id).await
    }

    /// Validates, executes and classifies one action against a page
    /// (spec.md §6's Control API `execute`). Never returns `Err` for a
    /// validator rejection or a terminal action failure — those surface as
    /// `ActionResult { success: false, .. }` so a transport adapter has a
    /// single success/failure shape to translate, not two.
    pub async fn execute(
        &self,
        session_id: &str,
        context_id: &str,
        page_id: &str,
        action: Action,
    ) -> CoreResult<ActionResult> {
        let start = Utc::now();
        let action_type = action.type_name();

        let session = self.store.get_session(session_id).await?;
        if session.is_expired() {
            return Err(CoreError::not_found(format!("session {session_id} expired")));
        }
        self.store.touch_session(session_id).await?;

        let context = self.store.get_context(context_id).await?;
        if context.session_id != session_id {
            return Err(CoreError::not_found(format!("context {context_id} does not belong to session {session_id}")));
        }
        if context.status != ContextStatus::Active {
            return Err(CoreError::conflict(format!("context {context_id} is closed")));
        }
        self.store.touch_context(context_id).await?;

        let outcome = self.chain.run(&action, &ChainOptions::default());
        if !outcome.is_valid() {
            self.audit
                .emit(AuditEvent::new(
                    "action.rejected",
                    Some(session_id.to_string()),
                    serde_json::json!({ "action_type": action_type, "errors": outcome.errors }),
                ))
                .await;
            return Ok(ActionResult::err(action_type, start, "SecurityViolation"));
        }
        for warning in &outcome.warnings {
            self.audit
                .emit(AuditEvent::new(
                    "action.warning",
                    Some(session_id.to_string()),
                    serde_json::json!({ "action_type": action_type, "warning": warning }),
                ))
                .await;
        }

        let (browser_id, proxy_id) = match self.ensure_lease(context_id).await {
            Ok(v) => v,
            Err(e) => {
                self.audit
                    .emit(AuditEvent::new(
                        "action.failed",
                        Some(session_id.to_string()),
                        serde_json::json!({ "action_type": action_type, "error": e.message }),
                    ))
                    .await;
                return Ok(ActionResult::err(action_type, start, e.label()));
            }
        };
        let page = self.page_manager.get_page(page_id).await?;

        let breaker = self.breakers.get_or_create(&browser_id).await;
        if !breaker.allow_call().await {
            self.audit
                .emit(AuditEvent::new(
                    "action.circuit_rejected",
                    Some(session_id.to_string()),
                    serde_json::json!({ "action_type": action_type, "browser_id": browser_id }),
                ))
                .await;
            return Ok(ActionResult::err(action_type, start, "CircuitOpen"));
        }

        let executor = self.executor.clone();
        let result = self
            .retry
            .run(action_type, Some(session_id), || {
                let executor = executor.clone();
                let action = action.clone();
                let page = page.clone();
                let session_id = session_id.to_string();
                async move { executor.execute(&action, page.as_ref(), &session_id).await }
            })
            .await;

        match result {
            Ok((mut action_result, attempt)) => {
                breaker.on_success().await;
                if attempt > 1 {
                    action_result = action_result.with_metadata("retryAttempt", serde_json::json!(attempt - 1));
                }
                if let Some(pid) = &proxy_id {
                    action_result = action_result.with_metadata("proxyId", serde_json::json!(pid));
                    self.proxy.report_success(pid, action_result.duration_ms as f64).await;
                }
                self.audit
                    .emit(AuditEvent::new(
                        "action.succeeded",
                        Some(session_id.to_string()),
                        serde_json::json!({ "action_type": action_type }),
                    ))
                    .await;
                Ok(action_result)
            }
            Err(err) => {
                breaker.on_failure().await;
                if let Some(pid) = &proxy_id {
                    if self.looks_proxy_related(&err.message) {
                        self.proxy.report_error(pid, &err.message).await;
                        match self.proxy.health_check(pid).await {
                            Ok(false) => {
                                if let Err(proxy_err) = self.rotate_proxy_on_error(context_id).await {
                                    warn!(context_id, error = %proxy_err, "proxy rotation on error failed");
                                }
                            }
                            Ok(true) => {}
                            Err(proxy_err) => {
                                warn!(context_id, error = %proxy_err, "proxy health check failed");
                            }
                        }
                    }
                }
                self.audit
                    .emit(AuditEvent::new(
                        "action.failed",
                        Some(session_id.to_string()),
                        serde_json::json!({ "action_type": action_type, "error": err.message }),
                    ))
                    .await;
                let mut action_result = ActionResult::err(action_type, start, err.label());
                if let Some(pid) = &proxy_id {
                    action_result = action_result.with_metadata("proxyId", serde_json::json!(pid));
                }
                Ok(action_result)
            }
        }
    }

    /// Only navigation/network-flavored failures imply the proxy itself is
    /// the problem; element/selector/script failures don't.
    fn looks_proxy_related(&self, error_message: &str) -> bool {
        use wayfarer_types::error::ErrorKind;
        matches!(
            wayfarer_actions::classifier::classify(error_message),
            ErrorKind::Timeout | ErrorKind::NavigationFailed | ErrorKind::UpstreamUnavailable
        )
    }

    /// Rotates the context's proxy after its health check fails and records
    /// the new assignment on the lease so the next `execute` picks it up.
    async fn rotate_proxy_on_error(&self, context_id: &str) -> CoreResult<()> {
        let new_proxy = self.proxy.rotate(context_id, ProxyRotationReason::OnError).await?;
        if let Some(lease) = self.leases.write().await.get_mut(context_id) {
            lease.proxy_id = Some(new_proxy.id);
        }
        Ok(())
    }
}
