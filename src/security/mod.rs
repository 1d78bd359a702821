//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming relay request:
//!     → rate_limit.rs (per-client fixed-window admission)
//!     → Pass to validation
//!
//! Outgoing response:
//!     → headers.rs (CORS, nosniff, HSTS)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject once the quota is used up
//! - No trust in client input beyond the edge-provided client IP header

pub mod headers;
pub mod rate_limit;

pub use rate_limit::{Admission, MemoryStore, RateLimitStore, RateLimiter};
