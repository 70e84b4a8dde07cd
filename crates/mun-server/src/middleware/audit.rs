//! Audit request scope middleware
//!
//! Wraps every request in a fresh task-local [`AuditScope`] carrying a v4
//! session id, the request path and method, and the session token (from the
//! Authorization header or session cookie). Statements observed while the
//! request runs are attributed to this scope. The layer also retries the
//! audit file sink registration once if it failed at startup.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{extract::Request, response::Response};
use tower::{Layer, Service};

use crate::audit::scope::{self, AuditScope};
use crate::audit::Auditor;
use crate::auth;

/// Layer that installs an audit scope around every request
#[derive(Clone)]
pub struct AuditScopeLayer {
    auditor: Arc<Auditor>,
    cookie_name: String,
}

impl AuditScopeLayer {
    pub fn new(auditor: Arc<Auditor>, cookie_name: impl Into<String>) -> Self {
        Self {
            auditor,
            cookie_name: cookie_name.into(),
        }
    }
}

impl<S> Layer<S> for AuditScopeLayer {
    type Service = AuditScopeMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuditScopeMiddleware {
            inner,
            auditor: Arc::clone(&self.auditor),
            cookie_name: self.cookie_name.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuditScopeMiddleware<S> {
    inner: S,
    auditor: Arc<Auditor>,
    cookie_name: String,
}

impl<S> Service<Request> for AuditScopeMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let mut inner = self.inner.clone();
        let auditor = Arc::clone(&self.auditor);
        let cookie_name = self.cookie_name.clone();

        Box::pin(async move {
            auditor.ensure_registered();

            // Body tokens are handled by the endpoints that parse a JSON
            // body; the scope only sees header and cookie sources.
            let token = auth::extract_token(request.headers(), &cookie_name, None);

            let scope = AuditScope::new(
                request.method().as_str(),
                request.uri().path(),
                token,
            );

            scope::with_scope(scope, inner.call(request)).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditConfig;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    fn test_auditor() -> Arc<Auditor> {
        let dir = tempfile::tempdir().unwrap();
        Auditor::new(AuditConfig {
            log_dir: dir.into_path().to_string_lossy().into_owned(),
            file_prefix: "audit".to_string(),
            max_file_bytes: 1024,
            max_files: 2,
            table: None,
        })
    }

    async fn scoped_handler() -> String {
        let token = scope::current(|s| s.token.clone()).flatten();
        let method = scope::current(|s| s.method.clone());
        format!("{:?}/{:?}", method, token)
    }

    #[tokio::test]
    async fn test_scope_visible_to_handler() {
        let app = Router::new()
            .route("/whoami", get(scoped_handler))
            .layer(AuditScopeLayer::new(test_auditor(), "mun_session"));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header("authorization", "Bearer tok123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"Some("GET")/Some("tok123")"#);
    }

    #[tokio::test]
    async fn test_cookie_token_reaches_scope() {
        let app = Router::new()
            .route("/whoami", get(scoped_handler))
            .layer(AuditScopeLayer::new(test_auditor(), "mun_session"));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header("cookie", "mun_session=cookietok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"Some("GET")/Some("cookietok")"#);
    }
}
