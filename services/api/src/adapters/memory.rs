//! services/api/src/adapters/memory.rs
//!
//! In-memory implementation of the `MatchingStore` port, backed by `HashMap`s
//! under a single `tokio::sync::RwLock`. It exists for local development and
//! tests (no external dependencies) and as the fallback when `DATABASE_URL`
//! is not configured.
//!
//! Not durable: all state is lost on process restart. The single write lock
//! is the serialization point that the Postgres adapter gets from its unique
//! constraints, so same-pair swipe upserts and match creation stay atomic
//! within one process.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use matchdeck_core::domain::{
    Actor, Listing, ListingKind, Match, MatchPair, Report, Swipe, SwipeDirection,
};
use matchdeck_core::ports::{MatchingStore, PortError, PortResult};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    actors: HashMap<Uuid, Actor>,
    listings: HashMap<Uuid, Listing>,
    /// Keyed by (viewer, target): the upsert law lives in the key.
    swipes: HashMap<(Uuid, Uuid), Swipe>,
    matches: HashMap<MatchPair, Match>,
    reports: Vec<Report>,
}

/// An in-memory store that implements the `MatchingStore` port.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchingStore for MemoryStore {
    async fn upsert_actor(&self, actor: Actor) -> PortResult<Actor> {
        let mut inner = self.inner.write().await;
        inner.actors.insert(actor.id, actor.clone());
        Ok(actor)
    }

    async fn get_actor(&self, actor_id: Uuid) -> PortResult<Actor> {
        let inner = self.inner.read().await;
        inner
            .actors
            .get(&actor_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Actor {} not found", actor_id)))
    }

    async fn insert_listing(&self, listing: Listing) -> PortResult<Listing> {
        let mut inner = self.inner.write().await;
        // Listings are immutable; a resync of an existing id keeps the stored row.
        let stored = inner
            .listings
            .entry(listing.id)
            .or_insert(listing)
            .clone();
        Ok(stored)
    }

    async fn get_listing(&self, listing_id: Uuid) -> PortResult<Listing> {
        let inner = self.inner.read().await;
        inner
            .listings
            .get(&listing_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Listing {} not found", listing_id)))
    }

    async fn unswiped_listings(
        &self,
        viewer_id: Uuid,
        kind: ListingKind,
    ) -> PortResult<Vec<Listing>> {
        let inner = self.inner.read().await;
        let mut eligible: Vec<Listing> = inner
            .listings
            .values()
            .filter(|l| l.kind() == kind)
            .filter(|l| l.owner_id != viewer_id)
            .filter(|l| !inner.swipes.contains_key(&(viewer_id, l.id)))
            .cloned()
            .collect();
        // Stable order so the engine's seeded shuffle is reproducible.
        eligible.sort_by_key(|l| l.id);
        Ok(eligible)
    }

    async fn upsert_swipe(
        &self,
        viewer_id: Uuid,
        target_id: Uuid,
        direction: SwipeDirection,
        at: DateTime<Utc>,
    ) -> PortResult<Swipe> {
        let mut inner = self.inner.write().await;
        let swipe = inner
            .swipes
            .entry((viewer_id, target_id))
            .and_modify(|existing| {
                existing.direction = direction;
                existing.updated_at = at;
            })
            .or_insert_with(|| Swipe {
                id: Uuid::new_v4(),
                viewer_id,
                target_id,
                direction,
                created_at: at,
                updated_at: at,
            })
            .clone();
        Ok(swipe)
    }

    async fn get_swipe(&self, viewer_id: Uuid, target_id: Uuid) -> PortResult<Option<Swipe>> {
        let inner = self.inner.read().await;
        Ok(inner.swipes.get(&(viewer_id, target_id)).cloned())
    }

    async fn interest_exists(&self, viewer_id: Uuid, owner_id: Uuid) -> PortResult<bool> {
        let inner = self.inner.read().await;
        let exists = inner.swipes.values().any(|s| {
            s.viewer_id == viewer_id
                && s.direction.is_interested()
                && inner
                    .listings
                    .get(&s.target_id)
                    .is_some_and(|l| l.owner_id == owner_id)
        });
        Ok(exists)
    }

    async fn interested_swipes(&self) -> PortResult<Vec<Swipe>> {
        let inner = self.inner.read().await;
        let mut swipes: Vec<Swipe> = inner
            .swipes
            .values()
            .filter(|s| s.direction.is_interested())
            .cloned()
            .collect();
        swipes.sort_by_key(|s| s.updated_at);
        Ok(swipes)
    }

    async fn create_match_if_absent(
        &self,
        pair: MatchPair,
        at: DateTime<Utc>,
    ) -> PortResult<(Match, bool)> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.matches.get(&pair) {
            return Ok((existing.clone(), false));
        }
        let created = Match {
            id: Uuid::new_v4(),
            candidate_id: pair.candidate_id,
            company_id: pair.company_id,
            created_at: at,
        };
        inner.matches.insert(pair, created.clone());
        Ok((created, true))
    }

    async fn get_match(&self, pair: MatchPair) -> PortResult<Option<Match>> {
        let inner = self.inner.read().await;
        Ok(inner.matches.get(&pair).cloned())
    }

    async fn matches_for_actor(&self, actor_id: Uuid) -> PortResult<Vec<Match>> {
        let inner = self.inner.read().await;
        let mut matches: Vec<Match> = inner
            .matches
            .values()
            .filter(|m| m.involves(actor_id))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }

    async fn insert_report(&self, report: Report) -> PortResult<Report> {
        let mut inner = self.inner.write().await;
        inner.reports.push(report.clone());
        Ok(report)
    }
}
