//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Validated query:
//!     → failover.rs (weighted pick + ordered fallback chain)
//!     → timeouts.rs (deadline per upstream attempt)
//!     → first 2xx answer, or every failure aggregated
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - Each provider is tried at most once per request
//! - No backoff between candidates; a failed provider is simply skipped

pub mod failover;
pub mod timeouts;

pub use failover::{candidate_chain, FailoverResolver, RelayAnswer, RelayOutcome};
