//! HTTP controllers for handling requests

pub mod discovery;
pub mod health;

pub use discovery::*;
pub use health::*;

use std::sync::Arc;

use crate::application::DiscoveryService;
use crate::config::Config;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub discovery_service: Arc<dyn DiscoveryService>,
    pub config: Arc<Config>,
}
