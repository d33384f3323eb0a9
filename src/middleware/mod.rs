//! The admission pipeline's middleware stages.
//!
//! Each stage is a hand-written Tower `Layer`/`Service` pair. Composed in
//! order by [`crate::routes::build_router`]:
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │    Recoverer     │ ← panics below become 500, process survives
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │     Logger       │ ← request tracing (development only)
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │  HEAD → GET      │ ← method normalized before inspection
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │    No-Cache      │ ← no-store headers on every response
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │    Heartbeat     │ ← 200 on the probe path, nothing below runs
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │   Rate Limiter   │ ← 429 when the global window is exhausted
//! └────────┬─────────┘
//!          ▼
//!   Mounted router (/api/v1)
//! ```
//!
//! The ordering is a correctness contract, not a styling choice: the
//! recoverer must wrap every later stage, the heartbeat must answer before
//! the limiter so orchestrator probes are never throttled, and the cache
//! suppressor must wrap both so even short-circuited responses are marked
//! non-cacheable.

pub mod get_head;
pub mod heartbeat;
pub mod no_cache;
pub mod rate_limit;
pub mod recover;

pub use get_head::GetHeadLayer;
pub use heartbeat::HeartbeatLayer;
pub use no_cache::NoCacheLayer;
pub use rate_limit::{Decision, FixedWindowLimiter, RateLimitLayer};
pub use recover::RecoverLayer;
