//! Admission pipeline composition.
//!
//! Builds the single composed handler the listener dispatches to: the
//! ordered middleware chain wrapped around the mounted API sub-router.
//!
//! # Stage Order (outermost first)
//!
//! 1. Recoverer - must wrap every later stage so a panic anywhere below is
//!    caught
//! 2. Logger - included only outside production
//! 3. HEAD normalizer - rewrites the method before anything inspects it
//! 4. Cache suppressor - marks every response no-store, including
//!    short-circuited ones
//! 5. Heartbeat - answers the probe path before the limiter can throttle it
//! 6. Rate limiter - global fixed-window quota over everything that remains
//! 7. Mounted sub-router at `/api/v1`
//!
//! Axum applies `.layer()` innermost-first, so the calls below appear in
//! the reverse of the order above.

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::middleware::{
    FixedWindowLimiter, GetHeadLayer, HeartbeatLayer, NoCacheLayer, RateLimitLayer, RecoverLayer,
};

/// Path prefix the API sub-router is mounted under.
pub const API_PREFIX: &str = "/api/v1";

/// Build the composed ingress handler.
///
/// `api` is the versioned sub-router; the pipeline treats it as opaque.
/// Tests mount their own routers here to probe the chain's behavior.
///
/// # Arguments
///
/// * `config` - Validated runtime configuration
/// * `api` - Sub-router to mount at [`API_PREFIX`]
pub fn build_router(config: &Config, api: Router) -> Router {
    let limiter = Arc::new(FixedWindowLimiter::new(
        config.rate_limit_max_requests,
        config.rate_limit_window,
    ));
    info!(
        max_requests = limiter.max_requests(),
        window_secs = limiter.window_len().as_secs(),
        "Global rate limiting enabled"
    );

    let mut router = Router::new()
        .nest(API_PREFIX, api)
        .layer(RateLimitLayer::new(limiter))
        .layer(HeartbeatLayer::new(&config.health_path))
        .layer(NoCacheLayer::new())
        .layer(GetHeadLayer::new());

    if config.request_logging_enabled() {
        info!("Request logging enabled (non-production environment)");
        router = router.layer(TraceLayer::new_for_http());
    }

    router.layer(RecoverLayer::new())
}
