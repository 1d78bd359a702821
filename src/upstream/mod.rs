//! Upstream resolver subsystem.
//!
//! # Data Flow
//! ```text
//! Config providers
//!     → provider.rs (validated descriptors)
//!     → registry.rs (ordered, read-only list)
//!     → weighted.rs (one weighted pick per request)
//!     → client.rs (DoH exchange with the chosen provider)
//! ```
//!
//! # Design Decisions
//! - Weights are `NonZeroU32`; a zero weight cannot be represented
//! - Selection is a pure function of the list and an injected RNG
//! - The exchange sits behind the `Upstream` trait so the failover path can
//!   be exercised without a network

pub mod client;
pub mod provider;
pub mod registry;
pub mod weighted;

pub use client::{DnsQuery, HttpUpstream, Upstream, UpstreamResponse, DNS_MESSAGE};
pub use provider::ProviderDescriptor;
pub use registry::ProviderRegistry;
pub use weighted::{select_index, select_one};
