//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use matchdeck_core::domain::Match;
use matchdeck_core::engine::SwipeEngine;
use matchdeck_core::ports::MatchingStore;
use std::sync::Arc;
use tokio::sync::broadcast;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The engine is the only way handlers touch domain logic; the store is held
/// separately for the auth middleware's actor lookup, and the broadcast
/// sender hands each WebSocket session its own event subscription.
#[derive(Clone)]
pub struct AppState {
    pub engine: SwipeEngine,
    pub store: Arc<dyn MatchingStore>,
    pub config: Arc<Config>,
    pub events: broadcast::Sender<Match>,
}
