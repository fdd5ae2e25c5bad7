//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `MatchingStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use matchdeck_core::domain::{
    Actor, ActorRole, Listing, ListingKind, Match, MatchPair, Report, ReportReason, Swipe,
    SwipeDirection,
};
use matchdeck_core::ports::{MatchingStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `MatchingStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// Enum <-> Column Text Mappings
//=========================================================================================

fn role_to_str(role: ActorRole) -> &'static str {
    match role {
        ActorRole::Candidate => "candidate",
        ActorRole::Company => "company",
    }
}

fn role_from_str(raw: &str) -> PortResult<ActorRole> {
    match raw {
        "candidate" => Ok(ActorRole::Candidate),
        "company" => Ok(ActorRole::Company),
        other => Err(PortError::Unexpected(format!(
            "unknown actor role in database: {other}"
        ))),
    }
}

fn kind_to_str(kind: ListingKind) -> &'static str {
    match kind {
        ListingKind::Job => "job",
        ListingKind::CandidateProfile => "candidate_profile",
    }
}

fn direction_to_str(direction: SwipeDirection) -> &'static str {
    match direction {
        SwipeDirection::Like => "like",
        SwipeDirection::Dislike => "dislike",
        SwipeDirection::SuperLike => "super_like",
    }
}

fn direction_from_str(raw: &str) -> PortResult<SwipeDirection> {
    match raw {
        "like" => Ok(SwipeDirection::Like),
        "dislike" => Ok(SwipeDirection::Dislike),
        "super_like" => Ok(SwipeDirection::SuperLike),
        other => Err(PortError::Unexpected(format!(
            "unknown swipe direction in database: {other}"
        ))),
    }
}

fn reason_to_str(reason: ReportReason) -> &'static str {
    match reason {
        ReportReason::Inappropriate => "inappropriate",
        ReportReason::Fake => "fake",
        ReportReason::Spam => "spam",
        ReportReason::Other => "other",
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ActorRecord {
    id: Uuid,
    role: String,
    display_name: String,
}
impl ActorRecord {
    fn to_domain(self) -> PortResult<Actor> {
        Ok(Actor {
            id: self.id,
            role: role_from_str(&self.role)?,
            display_name: self.display_name,
        })
    }
}

#[derive(FromRow)]
struct ListingRecord {
    id: Uuid,
    owner_id: Uuid,
    details: serde_json::Value,
    created_at: DateTime<Utc>,
}
impl ListingRecord {
    fn to_domain(self) -> PortResult<Listing> {
        let details = serde_json::from_value(self.details)
            .map_err(|e| PortError::Unexpected(format!("malformed listing details: {e}")))?;
        Ok(Listing {
            id: self.id,
            owner_id: self.owner_id,
            details,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct SwipeRecord {
    id: Uuid,
    viewer_id: Uuid,
    target_id: Uuid,
    direction: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl SwipeRecord {
    fn to_domain(self) -> PortResult<Swipe> {
        Ok(Swipe {
            id: self.id,
            viewer_id: self.viewer_id,
            target_id: self.target_id,
            direction: direction_from_str(&self.direction)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct MatchRecord {
    id: Uuid,
    candidate_id: Uuid,
    company_id: Uuid,
    created_at: DateTime<Utc>,
}
impl MatchRecord {
    fn to_domain(self) -> Match {
        Match {
            id: self.id,
            candidate_id: self.candidate_id,
            company_id: self.company_id,
            created_at: self.created_at,
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `MatchingStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl MatchingStore for PgStore {
    async fn upsert_actor(&self, actor: Actor) -> PortResult<Actor> {
        let record = sqlx::query_as::<_, ActorRecord>(
            "INSERT INTO actors (id, role, display_name) VALUES ($1, $2, $3)
             ON CONFLICT (id) DO UPDATE SET role = EXCLUDED.role, display_name = EXCLUDED.display_name
             RETURNING id, role, display_name",
        )
        .bind(actor.id)
        .bind(role_to_str(actor.role))
        .bind(&actor.display_name)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_actor(&self, actor_id: Uuid) -> PortResult<Actor> {
        let record = sqlx::query_as::<_, ActorRecord>(
            "SELECT id, role, display_name FROM actors WHERE id = $1",
        )
        .bind(actor_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Actor {} not found", actor_id)))?;
        record.to_domain()
    }

    async fn insert_listing(&self, listing: Listing) -> PortResult<Listing> {
        let details = serde_json::to_value(&listing.details)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        // Listings are immutable; a resync of an existing id is a no-op and
        // the stored row wins.
        sqlx::query(
            "INSERT INTO listings (id, owner_id, kind, details, created_at)
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (id) DO NOTHING",
        )
        .bind(listing.id)
        .bind(listing.owner_id)
        .bind(kind_to_str(listing.kind()))
        .bind(details)
        .bind(listing.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        self.get_listing(listing.id).await
    }

    async fn get_listing(&self, listing_id: Uuid) -> PortResult<Listing> {
        let record = sqlx::query_as::<_, ListingRecord>(
            "SELECT id, owner_id, details, created_at FROM listings WHERE id = $1",
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Listing {} not found", listing_id)))?;
        record.to_domain()
    }

    async fn unswiped_listings(
        &self,
        viewer_id: Uuid,
        kind: ListingKind,
    ) -> PortResult<Vec<Listing>> {
        let records = sqlx::query_as::<_, ListingRecord>(
            "SELECT l.id, l.owner_id, l.details, l.created_at
             FROM listings l
             WHERE l.kind = $2
               AND l.owner_id <> $1
               AND NOT EXISTS (
                   SELECT 1 FROM swipes s WHERE s.viewer_id = $1 AND s.target_id = l.id
               )
             ORDER BY l.id",
        )
        .bind(viewer_id)
        .bind(kind_to_str(kind))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn upsert_swipe(
        &self,
        viewer_id: Uuid,
        target_id: Uuid,
        direction: SwipeDirection,
        at: DateTime<Utc>,
    ) -> PortResult<Swipe> {
        // The composite unique key makes this atomic: concurrent swipes on
        // the same (viewer, target) pair serialize here, last write wins.
        let record = sqlx::query_as::<_, SwipeRecord>(
            "INSERT INTO swipes (id, viewer_id, target_id, direction, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             ON CONFLICT (viewer_id, target_id)
             DO UPDATE SET direction = EXCLUDED.direction, updated_at = EXCLUDED.updated_at
             RETURNING id, viewer_id, target_id, direction, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(viewer_id)
        .bind(target_id)
        .bind(direction_to_str(direction))
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_swipe(&self, viewer_id: Uuid, target_id: Uuid) -> PortResult<Option<Swipe>> {
        let record = sqlx::query_as::<_, SwipeRecord>(
            "SELECT id, viewer_id, target_id, direction, created_at, updated_at
             FROM swipes WHERE viewer_id = $1 AND target_id = $2",
        )
        .bind(viewer_id)
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(|r| r.to_domain()).transpose()
    }

    async fn interest_exists(&self, viewer_id: Uuid, owner_id: Uuid) -> PortResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                 SELECT 1 FROM swipes s
                 JOIN listings l ON l.id = s.target_id
                 WHERE s.viewer_id = $1
                   AND l.owner_id = $2
                   AND s.direction IN ('like', 'super_like')
             )",
        )
        .bind(viewer_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(exists)
    }

    async fn interested_swipes(&self) -> PortResult<Vec<Swipe>> {
        let records = sqlx::query_as::<_, SwipeRecord>(
            "SELECT id, viewer_id, target_id, direction, created_at, updated_at
             FROM swipes WHERE direction IN ('like', 'super_like') ORDER BY updated_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn create_match_if_absent(
        &self,
        pair: MatchPair,
        at: DateTime<Utc>,
    ) -> PortResult<(Match, bool)> {
        // Concurrent creators race on matches_pair_key. DO NOTHING turns the
        // loser's insert into an empty result; it then reads the winner's row.
        let inserted = sqlx::query_as::<_, MatchRecord>(
            "INSERT INTO matches (id, candidate_id, company_id, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (candidate_id, company_id) DO NOTHING
             RETURNING id, candidate_id, company_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(pair.candidate_id)
        .bind(pair.company_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        if let Some(record) = inserted {
            return Ok((record.to_domain(), true));
        }
        let existing = self.get_match(pair).await?.ok_or_else(|| {
            PortError::Conflict("match insert lost a race but no surviving row found".to_string())
        })?;
        Ok((existing, false))
    }

    async fn get_match(&self, pair: MatchPair) -> PortResult<Option<Match>> {
        let record = sqlx::query_as::<_, MatchRecord>(
            "SELECT id, candidate_id, company_id, created_at
             FROM matches WHERE candidate_id = $1 AND company_id = $2",
        )
        .bind(pair.candidate_id)
        .bind(pair.company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn matches_for_actor(&self, actor_id: Uuid) -> PortResult<Vec<Match>> {
        let records = sqlx::query_as::<_, MatchRecord>(
            "SELECT id, candidate_id, company_id, created_at
             FROM matches WHERE candidate_id = $1 OR company_id = $1
             ORDER BY created_at DESC",
        )
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn insert_report(&self, report: Report) -> PortResult<Report> {
        sqlx::query(
            "INSERT INTO reports (id, reporter_id, listing_id, reason, details, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(report.id)
        .bind(report.reporter_id)
        .bind(report.listing_id)
        .bind(reason_to_str(report.reason))
        .bind(&report.details)
        .bind(report.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(report)
    }
}
