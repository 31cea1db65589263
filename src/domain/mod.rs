//! Domain Layer - Core business logic and entities
//!
//! This module contains the tool entities, value objects, scoring rules and the
//! pure enrichment services used by tool discovery.

pub mod entities;
pub mod errors;
pub mod rules;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use rules::*;
pub use services::*;
pub use value_objects::*;
