//! HTTP facade over the persistence engine.
//!
//! Thin translation glue: handlers parse the request, call the library
//! operation, and translate the result. No authentication, no content
//! negotiation — graph payloads are Turtle, metadata is JSON.

mod handler;
mod server;

pub use server::{build_router, serve};

use std::sync::Arc;

use crate::config::{Config, GraphLayout};
use crate::store::QuadStore;

/// Shared state behind every handler.
pub struct AppState {
    /// Gateway to the backing store.
    pub store: Arc<dyn QuadStore>,
    /// Named-graph layout.
    pub layout: GraphLayout,
    /// Service configuration.
    pub config: Config,
}
