//! Liveness probe middleware.
//!
//! Answers a fixed path with a constant `200 OK` before rate limiting or
//! routing happens, so an orchestrator's health polling can never be
//! starved by load or throttled by the quota.
//!
//! # Path Matching
//!
//! The probe path is matched **exactly** (case-sensitive, no trailing
//! slash tolerance) against `request.uri().path()`, for any method. All
//! other requests pass through untouched.
//!
//! # Cost
//!
//! The response is built from static parts only; probe handling allocates
//! nothing beyond the response structure itself, which matters when load
//! balancers poll at high frequency.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use tower::{Layer, Service};

/// Body returned by the probe.
const HEARTBEAT_BODY: &str = ".";

/// Liveness probe layer for the Tower middleware stack.
#[derive(Clone)]
pub struct HeartbeatLayer {
    path: Arc<str>,
}

impl HeartbeatLayer {
    /// Create a probe layer answering `path` (e.g. "/status").
    pub fn new(path: &str) -> Self {
        Self { path: path.into() }
    }
}

impl<S> Layer<S> for HeartbeatLayer {
    type Service = HeartbeatService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HeartbeatService {
            inner,
            path: self.path.clone(),
        }
    }
}

/// Liveness probe service wrapper.
#[derive(Clone)]
pub struct HeartbeatService<S> {
    inner: S,
    path: Arc<str>,
}

impl<S> Service<Request<Body>> for HeartbeatService<S>
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
        if req.uri().path() == &*self.path {
            return Box::pin(async move { Ok(heartbeat_response()) });
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}

/// The fixed probe response.
fn heartbeat_response() -> Response<Body> {
    let mut response = Response::new(Body::from(HEARTBEAT_BODY));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
