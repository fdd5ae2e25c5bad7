//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the mobile client and the
//! API server for in-app match notifications.
//!
//! The socket is server-push only: clients authenticate on upgrade and then
//! just listen. Anything a client sends other than pings is ignored.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A new mutual match involving the connected actor was just created.
    MatchCreated {
        match_id: Uuid,
        candidate_id: Uuid,
        company_id: Uuid,
        created_at: DateTime<Utc>,
    },
}

impl ServerEvent {
    pub fn from_match(created: &matchdeck_core::domain::Match) -> Self {
        ServerEvent::MatchCreated {
            match_id: created.id,
            candidate_id: created.candidate_id,
            company_id: created.company_id,
            created_at: created.created_at,
        }
    }
}
