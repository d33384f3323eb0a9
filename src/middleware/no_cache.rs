//! Cache suppression middleware.
//!
//! Marks every response non-cacheable for clients and intermediaries. The
//! stage sits above the liveness probe and the rate limiter, so even
//! short-circuited responses (probe 200s, quota 429s) carry the headers.
//!
//! # Response Headers
//!
//! - `Expires: Thu, 01 Jan 1970 00:00:00 UTC`
//! - `Cache-Control: no-cache, no-store, no-transform, must-revalidate, private, max-age=0`
//! - `Pragma: no-cache`
//! - `X-Accel-Expires: 0`
//!
//! # Request Headers
//!
//! Conditional validator headers (`If-None-Match`, `If-Modified-Since`,
//! ...) are stripped from the request first, so a downstream handler can
//! never answer `304 Not Modified` from a stale validator.

use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{Request, Response};
use tower::{Layer, Service};

/// Request headers removed before the request continues down the chain.
const VALIDATOR_HEADERS: [HeaderName; 6] = [
    HeaderName::from_static("etag"),
    HeaderName::from_static("if-modified-since"),
    HeaderName::from_static("if-match"),
    HeaderName::from_static("if-none-match"),
    HeaderName::from_static("if-range"),
    HeaderName::from_static("if-unmodified-since"),
];

/// Response headers instructing every cache layer not to store the response.
const NO_CACHE_HEADERS: [(HeaderName, HeaderValue); 4] = [
    (
        HeaderName::from_static("expires"),
        HeaderValue::from_static("Thu, 01 Jan 1970 00:00:00 UTC"),
    ),
    (
        HeaderName::from_static("cache-control"),
        HeaderValue::from_static(
            "no-cache, no-store, no-transform, must-revalidate, private, max-age=0",
        ),
    ),
    (
        HeaderName::from_static("pragma"),
        HeaderValue::from_static("no-cache"),
    ),
    (
        HeaderName::from_static("x-accel-expires"),
        HeaderValue::from_static("0"),
    ),
];

/// Cache suppression layer for the Tower middleware stack.
#[derive(Clone, Default)]
pub struct NoCacheLayer;

impl NoCacheLayer {
    /// Create a new cache suppression layer.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for NoCacheLayer {
    type Service = NoCacheService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        NoCacheService { inner }
    }
}

/// Cache suppression service wrapper.
#[derive(Clone)]
pub struct NoCacheService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for NoCacheService<S>
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
        for name in &VALIDATOR_HEADERS {
            req.headers_mut().remove(name);
        }

        let mut inner = self.inner.clone();

        Box::pin(async move {
            let mut response = inner.call(req).await?;

            for (name, value) in &NO_CACHE_HEADERS {
                response.headers_mut().insert(name.clone(), value.clone());
            }

            Ok(response)
        })
    }
}
