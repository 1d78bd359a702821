//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (TLS terminated at the edge)
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (request ID, client key)
//!     → relay core (rate limit, validation, failover)
//!     → response.rs (headers, error mapping)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{client_key, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
