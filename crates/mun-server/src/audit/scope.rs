//! Request-scoped audit state
//!
//! Each request runs inside a task-local [`AuditScope`] installed by the
//! audit middleware. The scope carries the request identity (session id,
//! path, method, session token), a per-request actor cache, and the reentrant
//! suppression counter that keeps the audit pipeline from observing its own
//! statements.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use uuid::Uuid;

tokio::task_local! {
    static AUDIT_SCOPE: AuditScope;
}

/// Per-request audit context
#[derive(Debug)]
pub struct AuditScope {
    pub session_id: Uuid,
    pub request_path: String,
    pub method: String,
    pub token: Option<String>,
    suppression: Cell<u32>,
    /// token -> resolved actor id (None when the token matched no user)
    actor_cache: RefCell<HashMap<String, Option<i64>>>,
}

impl AuditScope {
    pub fn new(method: impl Into<String>, path: impl Into<String>, token: Option<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            request_path: path.into(),
            method: method.into(),
            token,
            suppression: Cell::new(0),
            actor_cache: RefCell::new(HashMap::new()),
        }
    }
}

/// Run a future inside a fresh audit scope
pub async fn with_scope<F>(scope: AuditScope, fut: F) -> F::Output
where
    F: std::future::Future,
{
    AUDIT_SCOPE.scope(scope, fut).await
}

/// Access the current scope, if any. Statements executed outside a request
/// (startup, background tasks) have no scope.
pub fn current<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&AuditScope) -> R,
{
    AUDIT_SCOPE.try_with(|scope| f(scope)).ok()
}

/// Whether the current scope has suppression active. Outside any scope this
/// is false: unscoped statements are still observable.
pub fn is_suppressed() -> bool {
    current(|scope| scope.suppression.get() > 0).unwrap_or(false)
}

/// Look up a previously resolved actor id for a token within this request
pub fn cached_actor(token: &str) -> Option<Option<i64>> {
    current(|scope| scope.actor_cache.borrow().get(token).copied()).flatten()
}

/// Remember a token resolution for the rest of the request
pub fn cache_actor(token: &str, actor: Option<i64>) {
    current(|scope| {
        scope
            .actor_cache
            .borrow_mut()
            .insert(token.to_string(), actor);
    });
}

/// RAII suppression: increments the scope counter on creation, decrements on
/// drop. Nesting is allowed; the counter is reentrant. Outside a scope the
/// guard is inert.
#[derive(Debug)]
pub struct SuppressGuard {
    active: bool,
}

pub fn suppress() -> SuppressGuard {
    let active = current(|scope| {
        scope.suppression.set(scope.suppression.get() + 1);
    })
    .is_some();
    SuppressGuard { active }
}

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        if self.active {
            current(|scope| {
                let count = scope.suppression.get();
                scope.suppression.set(count.saturating_sub(1));
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_suppression_is_reentrant() {
        let scope = AuditScope::new("POST", "/api/users", None);
        with_scope(scope, async {
            assert!(!is_suppressed());
            {
                let _outer = suppress();
                assert!(is_suppressed());
                {
                    let _inner = suppress();
                    assert!(is_suppressed());
                }
                assert!(is_suppressed());
            }
            assert!(!is_suppressed());
        })
        .await;
    }

    #[tokio::test]
    async fn test_no_scope_means_not_suppressed() {
        assert!(!is_suppressed());
        let _guard = suppress();
        assert!(!is_suppressed());
    }

    #[tokio::test]
    async fn test_actor_cache_is_per_request() {
        let scope = AuditScope::new("GET", "/api/logs", Some("tok".into()));
        with_scope(scope, async {
            assert_eq!(cached_actor("tok"), None);
            cache_actor("tok", Some(7));
            assert_eq!(cached_actor("tok"), Some(Some(7)));
            cache_actor("stale", None);
            assert_eq!(cached_actor("stale"), Some(None));
        })
        .await;

        let scope = AuditScope::new("GET", "/api/logs", Some("tok".into()));
        with_scope(scope, async {
            assert_eq!(cached_actor("tok"), None);
        })
        .await;
    }

    #[tokio::test]
    async fn test_scope_fields_visible() {
        let scope = AuditScope::new("DELETE", "/api/delegates/3", Some("abc".into()));
        with_scope(scope, async {
            let (method, path, token) = current(|s| {
                (
                    s.method.clone(),
                    s.request_path.clone(),
                    s.token.clone(),
                )
            })
            .unwrap();
            assert_eq!(method, "DELETE");
            assert_eq!(path, "/api/delegates/3");
            assert_eq!(token.as_deref(), Some("abc"));
        })
        .await;
    }
}
