//! Application Layer - Use cases and application services
//!
//! This module orchestrates discovery: it drives the aggregating repository,
//! applies domain scoring and ranks what comes back.

pub mod errors;
pub mod ranking;
pub mod recommendations;
pub mod services;


pub use errors::*;
pub use recommendations::{RecommendationRequest, RecommendationResult};
pub use services::*;
