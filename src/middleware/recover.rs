//! Panic containment middleware.
//!
//! The outermost stage of the admission pipeline: any panic raised by a
//! later stage or a mounted handler is caught here, logged, and converted
//! into a `500 Internal Server Error` so that neither the process nor
//! sibling requests are affected.
//!
//! # Behavior
//!
//! - The inner service call is wrapped in `AssertUnwindSafe(..).catch_unwind()`.
//! - On a panic, the method, path, and downcast panic payload are logged at
//!   error level. The standard panic hook has already reported the panic
//!   site (and a backtrace when `RUST_BACKTRACE` is set) to stderr.
//! - The client receives a constant 500 body with no internal detail.
//!
//! A panic is never swallowed silently and never crosses into another
//! request's execution. The binary must be built with unwinding panics;
//! `panic = "abort"` would bypass this stage entirely.

use std::panic::AssertUnwindSafe;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use futures_util::FutureExt;
use tower::{Layer, Service};
use tracing::error;

/// Panic containment layer for the Tower middleware stack.
#[derive(Clone, Default)]
pub struct RecoverLayer;

impl RecoverLayer {
    /// Create a new panic containment layer.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RecoverLayer {
    type Service = RecoverService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RecoverService { inner }
    }
}

/// Panic containment service wrapper.
#[derive(Clone)]
pub struct RecoverService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RecoverService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Captured before the request is moved into the inner service, so
        // the failure log can still name what was being handled.
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let mut inner = self.inner.clone();

        Box::pin(async move {
            match AssertUnwindSafe(inner.call(req)).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    let panic_message = panic_message(payload.as_ref());

                    error!(
                        method = %method,
                        path = %path,
                        panic_message = %panic_message,
                        "Handler panicked; responding 500"
                    );

                    Ok((StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
                        .into_response())
                }
            }
        })
    }
}

/// Extract a printable message from a panic payload.
///
/// Panics raised via `panic!` carry a `&str` or `String`; anything else is
/// reported as unknown rather than formatted blindly.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::Router;
    use axum::routing::get;
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route("/boom", get(|| async { panic!("handler exploded") } as fn() -> _))
            .layer(RecoverLayer::new())
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let resp = app()
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_panic_does_not_poison_later_requests() {
        let app = app();

        let boom = app
            .clone()
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(boom.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // An unrelated request on the same stack still succeeds
        let ok = app
            .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_panic_body_carries_no_detail() {
        let resp = app()
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(body, "internal server error");
        assert!(!body.contains("exploded"));
    }

    #[test]
    fn test_panic_message_downcasts() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static message");
        assert_eq!(panic_message(boxed.as_ref()), "static message");

        let boxed: Box<dyn std::any::Any + Send> = Box::new("owned".to_string());
        assert_eq!(panic_message(boxed.as_ref()), "owned");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
