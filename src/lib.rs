//! StackScout - developer tool discovery across public catalogs
//!
//! This crate provides a Domain-Driven Design (DDD) architecture for discovering
//! tools on npm, crates.io, GitHub and Docker Hub under per-source rate limits,
//! then scoring, classifying and ranking them into canonical summaries.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

pub use config::Config;
pub use logging::init_tracing;
