//! services/api/src/web/middleware.rs
//!
//! Actor-resolution middleware for protecting routes.
//!
//! Authentication itself happens upstream: the gateway verifies the caller
//! and forwards their id in the `x-actor-id` header. This middleware trusts
//! that header, resolves the actor against the read model, and hands the
//! resolved `Actor` to handlers via request extensions.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::web::state::AppState;

/// Middleware that resolves the gateway-verified `x-actor-id` header.
///
/// If valid, inserts the resolved `Actor` into request extensions for
/// handlers to use. If missing, malformed, or unknown, returns 401.
pub async fn require_actor(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the forwarded actor id
    let actor_id_str = req
        .headers()
        .get("x-actor-id")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let actor_id = Uuid::parse_str(actor_id_str).map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 2. Resolve against the actor read model
    let actor = state.store.get_actor(actor_id).await.map_err(|e| {
        warn!("Failed to resolve actor {}: {:?}", actor_id, e);
        StatusCode::UNAUTHORIZED
    })?;

    // 3. Insert the actor into request extensions
    req.extensions_mut().insert(actor);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
