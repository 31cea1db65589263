//! HTTP client plumbing shared by the tool sources

pub mod client;
pub mod rate_limiter;

pub use client::*;
pub use rate_limiter::*;
