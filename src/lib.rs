//! # Polygon Core
//!
//! The HTTP ingress layer of the Polygon backend: a request admission
//! pipeline in front of a versioned API, featuring:
//!
//! - **Crash isolation**: handler panics become 500s, never process exits
//! - **Global rate limiting**: a strict fixed-window quota shared by all
//!   clients
//! - **Liveness probing**: an unthrottled constant-cost health endpoint
//! - **Cache suppression**: every response marked no-store, including
//!   short-circuited ones
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Axum HTTP Server                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Admission pipeline                                         │
//! │  (Recover → Log → HEAD→GET → No-Cache → Heartbeat → Limit)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Mounted API sub-router (/api/v1)                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stage is a Tower `Layer`; the chain is composed once at startup by
//! [`build_router`] and ordering is part of the contract - see
//! [`middleware`] for the rationale.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use polygon_core::{AppState, Config, api, build_router};
//!
//! let config = Config::from_env()?;
//! let state = AppState::new(config.clone());
//! let app = build_router(&config, api::v1::router(state));
//! // Bind a listener and serve `app`...
//! ```
//!
//! ## Configuration
//!
//! Disable request logging in production:
//! ```bash
//! SERVICE_ENV=production cargo run
//! ```
//!
//! Tune the global quota:
//! ```bash
//! RATE_LIMIT_MAX_REQUESTS=100 RATE_LIMIT_WINDOW_SECS=60 cargo run
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod utils;

// Re-exports for convenience
pub use config::{Config, Environment};
pub use error::{AppError, AppResult};
pub use routes::{API_PREFIX, build_router};
pub use state::AppState;
