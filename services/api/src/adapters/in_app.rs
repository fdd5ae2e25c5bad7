//! services/api/src/adapters/in_app.rs
//!
//! This module contains the in-app notification adapter. It implements the
//! `MatchNotificationService` port by publishing fresh matches on a broadcast
//! bus; WebSocket sessions subscribe to the bus and forward events to their
//! connected actor.

use async_trait::async_trait;
use matchdeck_core::domain::Match;
use matchdeck_core::ports::{MatchNotificationService, PortResult};
use tokio::sync::broadcast;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `MatchNotificationService` over an in-process
/// broadcast channel.
#[derive(Clone)]
pub struct InAppNotifier {
    events: broadcast::Sender<Match>,
}

impl InAppNotifier {
    /// Creates a new `InAppNotifier` publishing on `events`.
    pub fn new(events: broadcast::Sender<Match>) -> Self {
        Self { events }
    }
}

//=========================================================================================
// `MatchNotificationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl MatchNotificationService for InAppNotifier {
    async fn notify_match(&self, created: &Match) -> PortResult<()> {
        // send() errs only when nobody is connected, which is not a delivery
        // failure: the match stays queryable through GET /matches.
        if self.events.send(created.clone()).is_err() {
            debug!(
                candidate = %created.candidate_id,
                company = %created.company_id,
                "no connected clients for in-app match event"
            );
        }
        Ok(())
    }
}
