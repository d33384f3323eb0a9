//! HEAD request normalization middleware.
//!
//! Rewrites `HEAD` requests to `GET` before routing, so every `GET` route
//! answers `HEAD` for free, then drops the response body while preserving
//! the status and headers. Runs before anything else inspects the method.

use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Method, Request, Response};
use tower::{Layer, Service};

/// HEAD normalization layer for the Tower middleware stack.
#[derive(Clone, Default)]
pub struct GetHeadLayer;

impl GetHeadLayer {
    /// Create a new HEAD normalization layer.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for GetHeadLayer {
    type Service = GetHeadService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GetHeadService { inner }
    }
}

/// HEAD normalization service wrapper.
#[derive(Clone)]
pub struct GetHeadService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for GetHeadService<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let is_head = req.method() == Method::HEAD;
        if is_head {
            *req.method_mut() = Method::GET;
        }

        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;

            if is_head {
                // Same status and headers, empty body
                let (parts, _body) = response.into_parts();
                return Ok(Response::from_parts(parts, Body::empty()));
            }

            Ok(response)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route(
                "/resource",
                get(|| async { ([("x-resource-kind", "demo")], "payload") }),
            )
            .layer(GetHeadLayer::new())
    }

    #[tokio::test]
    async fn test_head_is_served_by_get_route() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .method(Method::HEAD)
                    .uri("/resource")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        // Headers survive, body does not
        assert_eq!(resp.headers()["x-resource-kind"], "demo");
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_get_is_untouched() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri("/resource")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"payload");
    }
}
