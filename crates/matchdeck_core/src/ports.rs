//! crates/matchdeck_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the engine's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or
//! push providers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Actor, Listing, ListingKind, Match, MatchPair, Report, Swipe, SwipeDirection,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The swipe itself is malformed: self-swipe, nonexistent target, or a
    /// viewer swiping on its own side of the marketplace. Surfaced to the caller.
    #[error("Invalid swipe: {0}")]
    InvalidSwipe(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness conflict at the persistence layer. Internal; the engine
    /// resolves these by re-reading the surviving row.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Store Port (Trait)
//=========================================================================================

/// Persistence contract for everything the engine owns (swipes, matches,
/// reports) plus its read model of upstream-owned actors and listings.
#[async_trait]
pub trait MatchingStore: Send + Sync {
    // --- Actor / Listing Read Model ---
    async fn upsert_actor(&self, actor: Actor) -> PortResult<Actor>;

    async fn get_actor(&self, actor_id: Uuid) -> PortResult<Actor>;

    async fn insert_listing(&self, listing: Listing) -> PortResult<Listing>;

    async fn get_listing(&self, listing_id: Uuid) -> PortResult<Listing>;

    /// All listings of `kind` that `viewer_id` neither owns nor has swiped,
    /// in a stable order suitable for seeded shuffling.
    async fn unswiped_listings(
        &self,
        viewer_id: Uuid,
        kind: ListingKind,
    ) -> PortResult<Vec<Listing>>;

    // --- Swipes ---

    /// Upserts by (viewer, target): a later direction replaces the earlier
    /// one. This call is the serialization point for same-pair races.
    async fn upsert_swipe(
        &self,
        viewer_id: Uuid,
        target_id: Uuid,
        direction: SwipeDirection,
        at: DateTime<Utc>,
    ) -> PortResult<Swipe>;

    async fn get_swipe(&self, viewer_id: Uuid, target_id: Uuid) -> PortResult<Option<Swipe>>;

    /// Whether `viewer_id` has an interested swipe on any listing owned by
    /// `owner_id`. This is the reciprocal-direction lookup of match detection.
    async fn interest_exists(&self, viewer_id: Uuid, owner_id: Uuid) -> PortResult<bool>;

    /// Every interested swipe in the log, for recovery re-derivation.
    async fn interested_swipes(&self) -> PortResult<Vec<Swipe>>;

    // --- Matches ---

    /// Creates the match for `pair` unless one already exists. Returns the
    /// surviving match and whether this call created it; a concurrent loser
    /// must observe the winner's row rather than erroring.
    async fn create_match_if_absent(
        &self,
        pair: MatchPair,
        at: DateTime<Utc>,
    ) -> PortResult<(Match, bool)>;

    async fn get_match(&self, pair: MatchPair) -> PortResult<Option<Match>>;

    async fn matches_for_actor(&self, actor_id: Uuid) -> PortResult<Vec<Match>>;

    // --- Reports ---
    async fn insert_report(&self, report: Report) -> PortResult<Report>;
}

//=========================================================================================
// Notification Port (Trait)
//=========================================================================================

/// Delivery channel for freshly created matches. Called exactly once per
/// match creation; failures are the caller's to log, never to propagate.
#[async_trait]
pub trait MatchNotificationService: Send + Sync {
    async fn notify_match(&self, created: &Match) -> PortResult<()>;
}
