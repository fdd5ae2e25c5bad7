//! services/api/src/adapters/push.rs
//!
//! This module contains the push notification adapter. It implements the
//! `MatchNotificationService` port by POSTing match events to a configured
//! push gateway, which owns the actual APNs/FCM delivery.

use async_trait::async_trait;
use matchdeck_core::domain::Match;
use matchdeck_core::ports::{MatchNotificationService, PortError, PortResult};
use serde::Serialize;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `MatchNotificationService` against an HTTP
/// push gateway.
#[derive(Clone)]
pub struct PushGatewayNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl PushGatewayNotifier {
    /// Creates a new `PushGatewayNotifier` targeting `endpoint`.
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

/// The payload posted to the gateway. Both parties are named so the gateway
/// can fan out one device push per side.
#[derive(Serialize)]
struct MatchPushPayload<'a> {
    event: &'static str,
    match_id: &'a uuid::Uuid,
    candidate_id: &'a uuid::Uuid,
    company_id: &'a uuid::Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
}

//=========================================================================================
// `MatchNotificationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl MatchNotificationService for PushGatewayNotifier {
    async fn notify_match(&self, created: &Match) -> PortResult<()> {
        let payload = MatchPushPayload {
            event: "match_created",
            match_id: &created.id,
            candidate_id: &created.candidate_id,
            company_id: &created.company_id,
            created_at: created.created_at,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("push gateway request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "push gateway returned status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
