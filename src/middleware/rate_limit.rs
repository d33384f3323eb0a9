//! Global rate limiting middleware using a fixed-window counter.
//!
//! # Algorithm
//!
//! A strict fixed window: a single counter plus a window-start timestamp,
//! shared by **all** clients combined (a "limit-all" policy, not per-IP).
//! When a window of duration `D` elapses, the counter resets to zero and a
//! fresh window begins at the time of the observing request; there is no
//! partial carry-over and no sliding average. Within a window at most `N`
//! requests are admitted, regardless of how many callers race.
//!
//! # Concurrency
//!
//! The `{count, started}` pair is guarded by a single mutex, making the
//! check-reset-increment sequence one indivisible operation. Two concurrent
//! callers can never both observe the last free slot.
//!
//! # Response Headers
//!
//! On rate limit exceeded (429):
//! - `Retry-After`: Seconds until the current window ends
//! - `X-RateLimit-Limit`: Configured per-window quota
//! - `X-RateLimit-Remaining`: Remaining requests in current window (0)
//!
//! # Clock
//!
//! Timestamps are `std::time::Instant`, which is monotonic; wall-clock
//! adjustments cannot shrink or stretch a window. Tests drive the window
//! boundary through [`FixedWindowLimiter::admit_at`] with synthetic
//! instants instead of sleeping.

use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use tower::{Layer, Service};
use tracing::debug;

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request fits into the current window and has been counted.
    Allow,
    /// The window is exhausted; `retry_after` is the time left until it ends.
    Reject { retry_after: Duration },
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Mutable window state: the count of admitted requests and when the
/// current window began. Always mutated as a unit under the limiter's mutex.
#[derive(Debug)]
struct Window {
    count: u32,
    started: Instant,
}

/// Process-wide fixed-window rate limiter.
///
/// One instance is created at chain-build time and handed to the
/// [`RateLimitLayer`]; it is the only state in the admission pipeline
/// shared across concurrent requests.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_requests: u32,
    window_len: Duration,
    window: Mutex<Window>,
}

impl FixedWindowLimiter {
    /// Create a limiter admitting at most `max_requests` per `window_len`.
    pub fn new(max_requests: u32, window_len: Duration) -> Self {
        Self {
            max_requests,
            window_len,
            window: Mutex::new(Window {
                count: 0,
                started: Instant::now(),
            }),
        }
    }

    /// Configured per-window quota.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Configured window duration.
    pub fn window_len(&self) -> Duration {
        self.window_len
    }

    /// Check the current request against the quota, counting it if admitted.
    pub fn admit(&self) -> Decision {
        self.admit_at(Instant::now())
    }

    /// Admission check against an explicit observation time.
    ///
    /// `admit` delegates here with `Instant::now()`; tests call this
    /// directly to step across window boundaries without sleeping.
    pub fn admit_at(&self, now: Instant) -> Decision {
        // A poisoned lock means another admit panicked mid-update; the
        // guarded state is two plain integers and remains usable.
        let mut window = self
            .window
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let elapsed = now.duration_since(window.started);
        if elapsed >= self.window_len {
            window.count = 0;
            window.started = now;
        }

        if window.count < self.max_requests {
            window.count += 1;
            Decision::Allow
        } else {
            let retry_after = self
                .window_len
                .saturating_sub(now.duration_since(window.started));
            Decision::Reject { retry_after }
        }
    }
}

/// Rate limiting layer for the Tower middleware stack.
///
/// Applies the shared [`FixedWindowLimiter`] to every request that reaches
/// it; the liveness probe sits above this layer and is never throttled.
///
/// # Example
///
/// ```rust,ignore
/// let limiter = Arc::new(FixedWindowLimiter::new(100, Duration::from_secs(60)));
/// let app = Router::new()
///     .route("/api", get(handler))
///     .layer(RateLimitLayer::new(limiter));
/// ```
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<FixedWindowLimiter>,
}

impl RateLimitLayer {
    /// Create a rate limit layer around an explicit limiter handle.
    pub fn new(limiter: Arc<FixedWindowLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

/// Rate limiting service wrapper.
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Arc<FixedWindowLimiter>,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
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
        let limiter = self.limiter.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match limiter.admit() {
                Decision::Allow => inner.call(req).await,
                Decision::Reject { retry_after } => {
                    // Policy rejection, not an error; keep it at debug level
                    debug!(
                        method = %req.method(),
                        path = %req.uri().path(),
                        retry_after_secs = retry_after.as_secs(),
                        "Rate limit exceeded"
                    );

                    let retry_after_secs = retry_after.as_secs().max(1);
                    let response = (
                        StatusCode::TOO_MANY_REQUESTS,
                        [
                            ("Retry-After", retry_after_secs.to_string()),
                            ("X-RateLimit-Limit", limiter.max_requests().to_string()),
                            ("X-RateLimit-Remaining", "0".to_string()),
                        ],
                        "rate limit exceeded",
                    )
                        .into_response();

                    Ok(response)
                }
            }
        })
    }
}
