//! Infrastructure Layer - External concerns and implementations
//!
//! This module handles the external tool catalogs: HTTP clients, rate limiting,
//! response caching, source adapters and cross-source aggregation.

pub mod api_clients;
pub mod cache;
pub mod repositories;
pub mod sources;

pub use api_clients::{RateLimitedClient, RequestOptions, SlidingWindowRateLimiter};
pub use cache::TtlCache;
pub use repositories::*;
pub use sources::{SearchFilter, ToolSource, build_sources};
