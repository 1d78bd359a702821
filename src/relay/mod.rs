//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! Request on the relay path
//!     → rate limiter (per-client admission)
//!     → validator.rs (method, content type, size, encoding)
//!     → failover orchestrator (weighted pick, ordered fallback)
//!     → handler.rs (response assembly, stats)
//! ```
//!
//! # Design Decisions
//! - Every failure is a typed error (error.rs) with a fixed HTTP mapping
//! - Nothing reaches an upstream before admission and validation pass

pub mod error;
pub mod handler;
pub mod validator;

pub use error::{AdmissionError, ExhaustionError, RelayError, UpstreamError, ValidationError};
pub use handler::{Outcome, RelayBuildError, RelayCore, RelayStats, StatsSnapshot};
