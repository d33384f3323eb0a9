//! Versioned API sub-routers mounted under the admission pipeline.
//!
//! The pipeline treats each version's router as an opaque handler: requests
//! that survive admission are forwarded to it unmodified, and its responses
//! pass back through (picking up the universal no-store headers on the way
//! out).

pub mod v1;
