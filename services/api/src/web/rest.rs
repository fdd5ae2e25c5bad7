//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use matchdeck_core::domain::{
    Actor, ActorRole, Listing, ListingDetails, ListingKind, Match, ReportReason, SwipeDirection,
};
use matchdeck_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        submit_swipe_handler,
        cards_handler,
        matches_handler,
        report_handler,
        register_actor_handler,
        publish_listing_handler,
        rebuild_matches_handler,
    ),
    components(
        schemas(
            SwipeRequest,
            SwipeResponse,
            CardPageResponse,
            CardDto,
            MatchDto,
            ReportRequest,
            ReportResponse,
            RegisterActorRequest,
            ActorDto,
            PublishListingRequest,
            RebuildResponse,
        )
    ),
    tags(
        (name = "Matchdeck API", description = "API endpoints for the mutual-match swipe engine.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// One swipe decision submitted by a client.
#[derive(Deserialize, ToSchema)]
pub struct SwipeRequest {
    pub viewer_id: Uuid,
    pub target_id: Uuid,
    #[schema(value_type = String, example = "like")]
    pub direction: SwipeDirection,
}

/// The outcome of a swipe: the durable record plus whether it created a match.
#[derive(Serialize, ToSchema)]
pub struct SwipeResponse {
    pub swipe_id: Uuid,
    pub match_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct CardsQuery {
    pub actor_id: Option<Uuid>,
    pub limit: Option<usize>,
    pub seed: Option<u64>,
    pub offset: Option<usize>,
}

/// A swipeable card.
#[derive(Serialize, ToSchema)]
pub struct CardDto {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "job")]
    pub kind: String,
    /// Role-specific display attributes, tagged by `kind`.
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl CardDto {
    fn from_domain(listing: Listing) -> Result<Self, (StatusCode, String)> {
        let details = serde_json::to_value(&listing.details).map_err(|e| {
            error!("Failed to serialize listing details: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to serialize listing".to_string(),
            )
        })?;
        Ok(Self {
            id: listing.id,
            owner_id: listing.owner_id,
            kind: match listing.kind() {
                ListingKind::Job => "job".to_string(),
                ListingKind::CandidateProfile => "candidate_profile".to_string(),
            },
            details,
            created_at: listing.created_at,
        })
    }
}

/// One page of the card queue. Clients echo `seed` (and advance `offset`)
/// to paginate the same queue session without duplicates.
#[derive(Serialize, ToSchema)]
pub struct CardPageResponse {
    pub seed: u64,
    pub cards: Vec<CardDto>,
}

#[derive(Deserialize)]
pub struct MatchesQuery {
    pub actor_id: Option<Uuid>,
}

/// A mutual match visible to one of its two parties.
#[derive(Serialize, ToSchema)]
pub struct MatchDto {
    pub match_id: Uuid,
    pub candidate_id: Uuid,
    pub company_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl MatchDto {
    fn from_domain(m: Match) -> Self {
        Self {
            match_id: m.id,
            candidate_id: m.candidate_id,
            company_id: m.company_id,
            created_at: m.created_at,
        }
    }
}

/// A complaint about a listing, forwarded to upstream moderation.
#[derive(Deserialize, ToSchema)]
pub struct ReportRequest {
    pub listing_id: Uuid,
    #[schema(value_type = String, example = "spam")]
    pub reason: ReportReason,
    pub details: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ReportResponse {
    pub report_id: Uuid,
}

/// Actor sync payload from the upstream account system.
#[derive(Deserialize, ToSchema)]
pub struct RegisterActorRequest {
    pub id: Uuid,
    #[schema(value_type = String, example = "candidate")]
    pub role: ActorRole,
    pub display_name: String,
}

#[derive(Serialize, ToSchema)]
pub struct ActorDto {
    pub id: Uuid,
    #[schema(value_type = String, example = "candidate")]
    pub role: ActorRole,
    pub display_name: String,
}

/// Listing sync payload from the upstream profile system.
#[derive(Deserialize, ToSchema)]
pub struct PublishListingRequest {
    /// Upstream-assigned listing id; generated when absent.
    pub id: Option<Uuid>,
    pub owner_id: Uuid,
    /// Role-specific attributes, tagged by `kind` (`job` or `candidate_profile`).
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
}

#[derive(Serialize, ToSchema)]
pub struct RebuildResponse {
    pub created: usize,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a port error onto the HTTP surface. Conflicts never escape the
/// engine, so anything unexpected lands on 500 and the client retries.
fn port_error_response(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::InvalidSwipe(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Conflict(_) | PortError::Unexpected(_) => {
            error!("Request failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Submit one swipe decision.
///
/// The viewer in the body must be the actor named by the `x-actor-id` header.
#[utoipa::path(
    post,
    path = "/swipes",
    request_body = SwipeRequest,
    responses(
        (status = 201, description = "Swipe recorded", body = SwipeResponse),
        (status = 403, description = "Viewer does not match the authenticated actor"),
        (status = 422, description = "Invalid swipe (self-swipe, unknown or incoherent target)"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-actor-id" = Uuid, Header, description = "The gateway-verified actor id.")
    )
)]
pub async fn submit_swipe_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<SwipeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.viewer_id != actor.id {
        return Err((
            StatusCode::FORBIDDEN,
            "viewer_id does not match the authenticated actor".to_string(),
        ));
    }

    let outcome = app_state
        .engine
        .submit_swipe(payload.viewer_id, payload.target_id, payload.direction, Utc::now())
        .await
        .map_err(port_error_response)?;

    let response = SwipeResponse {
        swipe_id: outcome.swipe.id,
        match_created: outcome.created_match.is_some(),
        match_id: outcome.created_match.map(|m| m.id),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetch the next page of cards for the authenticated actor.
#[utoipa::path(
    get,
    path = "/cards",
    responses(
        (status = 200, description = "One page of the card queue", body = CardPageResponse),
        (status = 403, description = "actor_id does not match the authenticated actor"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-actor-id" = Uuid, Header, description = "The gateway-verified actor id."),
        ("actor_id" = Option<Uuid>, Query, description = "Must equal the authenticated actor when present."),
        ("limit" = Option<usize>, Query, description = "Page size; server default applies when absent."),
        ("seed" = Option<u64>, Query, description = "Queue-session seed returned by a previous page."),
        ("offset" = Option<usize>, Query, description = "Cards to skip within the session.")
    )
)]
pub async fn cards_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<CardsQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if query.actor_id.is_some_and(|id| id != actor.id) {
        return Err((
            StatusCode::FORBIDDEN,
            "actor_id does not match the authenticated actor".to_string(),
        ));
    }

    let limit = query
        .limit
        .unwrap_or(app_state.config.default_card_limit)
        .min(100);
    let page = app_state
        .engine
        .next_cards(actor.id, limit, query.seed, query.offset.unwrap_or(0))
        .await
        .map_err(port_error_response)?;

    let cards = page
        .cards
        .into_iter()
        .map(CardDto::from_domain)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(CardPageResponse {
        seed: page.seed,
        cards,
    }))
}

/// List the matches visible to the authenticated actor.
#[utoipa::path(
    get,
    path = "/matches",
    responses(
        (status = 200, description = "Matches involving the actor", body = [MatchDto]),
        (status = 403, description = "actor_id does not match the authenticated actor"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-actor-id" = Uuid, Header, description = "The gateway-verified actor id."),
        ("actor_id" = Option<Uuid>, Query, description = "Must equal the authenticated actor when present.")
    )
)]
pub async fn matches_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<MatchesQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if query.actor_id.is_some_and(|id| id != actor.id) {
        return Err((
            StatusCode::FORBIDDEN,
            "actor_id does not match the authenticated actor".to_string(),
        ));
    }

    let matches = app_state
        .engine
        .matches_for(actor.id)
        .await
        .map_err(port_error_response)?;
    let matches: Vec<MatchDto> = matches.into_iter().map(MatchDto::from_domain).collect();
    Ok(Json(matches))
}

/// Report a listing to upstream moderation.
#[utoipa::path(
    post,
    path = "/reports",
    request_body = ReportRequest,
    responses(
        (status = 202, description = "Report recorded", body = ReportResponse),
        (status = 404, description = "Unknown listing"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-actor-id" = Uuid, Header, description = "The gateway-verified actor id.")
    )
)]
pub async fn report_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ReportRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let report = app_state
        .engine
        .report_listing(
            actor.id,
            payload.listing_id,
            payload.reason,
            payload.details,
            Utc::now(),
        )
        .await
        .map_err(port_error_response)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ReportResponse {
            report_id: report.id,
        }),
    ))
}

/// Sync an actor from the upstream account system.
#[utoipa::path(
    post,
    path = "/actors",
    request_body = RegisterActorRequest,
    responses(
        (status = 201, description = "Actor stored", body = ActorDto),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_actor_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RegisterActorRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let actor = app_state
        .engine
        .register_actor(Actor {
            id: payload.id,
            role: payload.role,
            display_name: payload.display_name,
        })
        .await
        .map_err(port_error_response)?;
    let response = ActorDto {
        id: actor.id,
        role: actor.role,
        display_name: actor.display_name,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Sync a listing from the upstream profile system.
#[utoipa::path(
    post,
    path = "/listings",
    request_body = PublishListingRequest,
    responses(
        (status = 201, description = "Listing stored", body = CardDto),
        (status = 404, description = "Unknown owner"),
        (status = 422, description = "Listing kind does not fit the owner's role"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn publish_listing_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<PublishListingRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let details: ListingDetails = serde_json::from_value(payload.details).map_err(|e| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Malformed listing details: {e}"),
        )
    })?;
    let listing = app_state
        .engine
        .publish_listing(Listing {
            id: payload.id.unwrap_or_else(Uuid::new_v4),
            owner_id: payload.owner_id,
            details,
            created_at: Utc::now(),
        })
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(CardDto::from_domain(listing)?)))
}

/// Re-derive matches from the swipe log (operator recovery).
#[utoipa::path(
    post,
    path = "/admin/rebuild-matches",
    responses(
        (status = 200, description = "Rebuild complete", body = RebuildResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn rebuild_matches_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let created = app_state
        .engine
        .rebuild_matches(Utc::now())
        .await
        .map_err(port_error_response)?;
    Ok(Json(RebuildResponse { created }))
}
