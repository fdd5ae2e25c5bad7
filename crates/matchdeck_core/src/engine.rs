//! crates/matchdeck_core/src/engine.rs
//!
//! The swipe engine: swipe submission with mutual-match detection, the card
//! queue, and recovery re-derivation of matches from the swipe log. All logic
//! here is expressed against the ports, so it runs unchanged over any store
//! or notification backend.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    Actor, ActorRole, Listing, ListingDetails, ListingKind, Match, MatchPair, Report,
    ReportReason, Swipe, SwipeDirection,
};
use crate::ports::{MatchNotificationService, MatchingStore, PortError, PortResult};

//=========================================================================================
// Engine Outputs
//=========================================================================================

/// The result of one swipe submission.
#[derive(Debug, Clone)]
pub struct SwipeOutcome {
    pub swipe: Swipe,
    /// Present only when this swipe created a new match. A swipe that lands
    /// on a pair that is already matched reports `None` here.
    pub created_match: Option<Match>,
}

/// One page of the card queue, together with the seed that ordered it.
/// Clients pass the seed back to paginate the same queue session.
#[derive(Debug, Clone)]
pub struct CardPage {
    pub seed: u64,
    pub cards: Vec<Listing>,
}

//=========================================================================================
// The Engine
//=========================================================================================

/// Stateless orchestration over the store and notification ports. The store
/// is the only shared mutable resource; the engine itself can be cloned and
/// shared freely across request handlers.
#[derive(Clone)]
pub struct SwipeEngine {
    store: Arc<dyn MatchingStore>,
    notifiers: Vec<Arc<dyn MatchNotificationService>>,
}

impl SwipeEngine {
    pub fn new(
        store: Arc<dyn MatchingStore>,
        notifiers: Vec<Arc<dyn MatchNotificationService>>,
    ) -> Self {
        Self { store, notifiers }
    }

    //-------------------------------------------------------------------------------------
    // Read-model ingest (actors and listings are owned upstream)
    //-------------------------------------------------------------------------------------

    pub async fn register_actor(&self, actor: Actor) -> PortResult<Actor> {
        self.store.upsert_actor(actor).await
    }

    /// Accepts a listing from the upstream profile system. The owner must
    /// exist and the listing kind must agree with the owner's role.
    pub async fn publish_listing(&self, listing: Listing) -> PortResult<Listing> {
        let owner = self.store.get_actor(listing.owner_id).await?;
        let expected = match owner.role {
            ActorRole::Company => ListingKind::Job,
            ActorRole::Candidate => ListingKind::CandidateProfile,
        };
        if listing.kind() != expected {
            return Err(PortError::InvalidSwipe(format!(
                "listing kind {:?} does not fit owner role {:?}",
                listing.kind(),
                owner.role
            )));
        }
        self.store.insert_listing(listing).await
    }

    //-------------------------------------------------------------------------------------
    // Swipe submission and match detection
    //-------------------------------------------------------------------------------------

    /// Records one swipe and runs match detection on it.
    ///
    /// The swipe write is the durable part: if it fails the whole request
    /// fails and the client retries. Match evaluation failing afterwards is
    /// recoverable (matches can be re-derived from the swipe log), so it is
    /// logged and the swipe still reported as accepted.
    pub async fn submit_swipe(
        &self,
        viewer_id: Uuid,
        target_id: Uuid,
        direction: SwipeDirection,
        at: DateTime<Utc>,
    ) -> PortResult<SwipeOutcome> {
        let listing = match self.store.get_listing(target_id).await {
            Ok(listing) => listing,
            Err(PortError::NotFound(_)) => {
                return Err(PortError::InvalidSwipe(format!(
                    "target listing {} does not exist",
                    target_id
                )))
            }
            Err(e) => return Err(e),
        };
        if listing.owner_id == viewer_id {
            return Err(PortError::InvalidSwipe(
                "cannot swipe on your own listing".to_string(),
            ));
        }
        let viewer = self.store.get_actor(viewer_id).await?;
        // A candidate swipes jobs, a company swipes candidate profiles.
        pair_for(&viewer, &listing)?;

        let swipe = self
            .store
            .upsert_swipe(viewer_id, target_id, direction, at)
            .await?;

        if !direction.is_interested() {
            return Ok(SwipeOutcome {
                swipe,
                created_match: None,
            });
        }

        let created_match = match self.evaluate_for_match(&viewer, &listing, at).await {
            Ok(created) => created,
            Err(e) => {
                // The swipe is already durable; the match remains derivable
                // from the log, so this must not fail the request.
                warn!(
                    viewer = %viewer_id,
                    target = %target_id,
                    "match evaluation failed after durable swipe write: {e}"
                );
                None
            }
        };

        if let Some(ref created) = created_match {
            self.dispatch_notifications(created).await;
        }

        Ok(SwipeOutcome {
            swipe,
            created_match,
        })
    }

    /// Checks reciprocity for an interested swipe by `viewer` on `listing`.
    ///
    /// Reciprocity means the listing's owner has an interested swipe on some
    /// listing owned by the viewer (a company likes the candidate's profile,
    /// not the job back). Returns the match only when this call created it.
    async fn evaluate_for_match(
        &self,
        viewer: &Actor,
        listing: &Listing,
        at: DateTime<Utc>,
    ) -> PortResult<Option<Match>> {
        let pair = pair_for(viewer, listing)?;

        if self.store.get_match(pair).await?.is_some() {
            return Ok(None);
        }
        if !self
            .store
            .interest_exists(listing.owner_id, viewer.id)
            .await?
        {
            return Ok(None);
        }

        // The store enforces at-most-one match per pair; a concurrent writer
        // that loses the race observes the winner's row and reports nothing.
        let (surviving, created_here) = self.store.create_match_if_absent(pair, at).await?;
        if created_here {
            info!(
                candidate = %surviving.candidate_id,
                company = %surviving.company_id,
                "match created"
            );
            Ok(Some(surviving))
        } else {
            Ok(None)
        }
    }

    /// Fans a fresh match out to every configured channel. Delivery is a
    /// convenience, not the source of truth: failures are logged and the
    /// match stays queryable regardless.
    async fn dispatch_notifications(&self, created: &Match) {
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify_match(created).await {
                warn!(
                    candidate = %created.candidate_id,
                    company = %created.company_id,
                    "match notification delivery failed: {e}"
                );
            }
        }
    }

    //-------------------------------------------------------------------------------------
    // Card queue
    //-------------------------------------------------------------------------------------

    /// Computes one page of cards for `actor_id`.
    ///
    /// The queue excludes the actor's own listings and anything already
    /// swiped. Ordering is a seeded shuffle: the rank of a card depends only
    /// on (seed, listing id), so within one queue session cards keep their
    /// relative order as neighbours get swiped away, and paginating with the
    /// returned seed never delivers duplicates.
    pub async fn next_cards(
        &self,
        actor_id: Uuid,
        limit: usize,
        seed: Option<u64>,
        offset: usize,
    ) -> PortResult<CardPage> {
        let actor = self.store.get_actor(actor_id).await?;
        let kind = match actor.role {
            ActorRole::Candidate => ListingKind::Job,
            ActorRole::Company => ListingKind::CandidateProfile,
        };
        let seed = seed.unwrap_or_else(|| rand::random());

        let mut cards = self.store.unswiped_listings(actor_id, kind).await?;
        cards.sort_by_key(|listing| shuffle_rank(seed, listing.id));
        let cards = cards.into_iter().skip(offset).take(limit).collect();

        Ok(CardPage { seed, cards })
    }

    //-------------------------------------------------------------------------------------
    // Matches and reports
    //-------------------------------------------------------------------------------------

    pub async fn matches_for(&self, actor_id: Uuid) -> PortResult<Vec<Match>> {
        // Resolve the actor first so an unknown id is a 404, not an empty list.
        self.store.get_actor(actor_id).await?;
        self.store.matches_for_actor(actor_id).await
    }

    pub async fn report_listing(
        &self,
        reporter_id: Uuid,
        listing_id: Uuid,
        reason: ReportReason,
        details: Option<String>,
        at: DateTime<Utc>,
    ) -> PortResult<Report> {
        self.store.get_actor(reporter_id).await?;
        self.store.get_listing(listing_id).await?;
        let report = Report {
            id: Uuid::new_v4(),
            reporter_id,
            listing_id,
            reason,
            details,
            created_at: at,
        };
        self.store.insert_report(report).await
    }

    //-------------------------------------------------------------------------------------
    // Recovery
    //-------------------------------------------------------------------------------------

    /// Re-derives the match set from the swipe log alone and returns how many
    /// matches were missing. Safe to run at any time: it reuses the same
    /// create-if-absent path as live detection, so existing matches are left
    /// untouched and nothing is ever notified from here.
    pub async fn rebuild_matches(&self, at: DateTime<Utc>) -> PortResult<usize> {
        let swipes = self.store.interested_swipes().await?;

        // Which sides of each pair have expressed interest.
        let mut sides: HashMap<MatchPair, (bool, bool)> = HashMap::new();
        for swipe in swipes {
            let listing = self.store.get_listing(swipe.target_id).await?;
            let (pair, from_candidate) = match listing.kind() {
                ListingKind::Job => (
                    MatchPair {
                        candidate_id: swipe.viewer_id,
                        company_id: listing.owner_id,
                    },
                    true,
                ),
                ListingKind::CandidateProfile => (
                    MatchPair {
                        candidate_id: listing.owner_id,
                        company_id: swipe.viewer_id,
                    },
                    false,
                ),
            };
            let entry = sides.entry(pair).or_insert((false, false));
            if from_candidate {
                entry.0 = true;
            } else {
                entry.1 = true;
            }
        }

        let mut created = 0;
        for (pair, (candidate_side, company_side)) in sides {
            if candidate_side && company_side {
                let (_, created_here) = self.store.create_match_if_absent(pair, at).await?;
                if created_here {
                    created += 1;
                }
            }
        }
        if created > 0 {
            info!(created, "rebuild derived missing matches from the swipe log");
        }
        Ok(created)
    }
}

//=========================================================================================
// Pure Helpers
//=========================================================================================

/// Normalizes (viewer, listing) into the (candidate, company) match pair,
/// rejecting swipes on the viewer's own side of the marketplace.
fn pair_for(viewer: &Actor, listing: &Listing) -> PortResult<MatchPair> {
    match (viewer.role, &listing.details) {
        (ActorRole::Candidate, ListingDetails::Job(_)) => Ok(MatchPair {
            candidate_id: viewer.id,
            company_id: listing.owner_id,
        }),
        (ActorRole::Company, ListingDetails::CandidateProfile(_)) => Ok(MatchPair {
            candidate_id: listing.owner_id,
            company_id: viewer.id,
        }),
        _ => Err(PortError::InvalidSwipe(format!(
            "{:?} actors cannot swipe on {:?} listings",
            viewer.role,
            listing.kind()
        ))),
    }
}

/// Deterministic queue rank for one card. Depends only on (seed, id), so a
/// card's position survives other cards leaving the eligible set.
fn shuffle_rank(seed: u64, id: Uuid) -> u64 {
    let (hi, lo) = id.as_u64_pair();
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ hi ^ lo.rotate_left(32));
    rng.next_u64()
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Availability, CandidateProfileDetails, EmploymentType, JobDetails};

    fn candidate(id: Uuid) -> Actor {
        Actor {
            id,
            role: ActorRole::Candidate,
            display_name: "Anna Schmidt".to_string(),
        }
    }

    fn company(id: Uuid) -> Actor {
        Actor {
            id,
            role: ActorRole::Company,
            display_name: "Acme GmbH".to_string(),
        }
    }

    fn job(owner_id: Uuid) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            owner_id,
            details: ListingDetails::Job(JobDetails {
                title: "Backend Engineer".to_string(),
                location: "Berlin".to_string(),
                employment_type: EmploymentType::FullTime,
                salary: None,
                required_skills: vec!["Rust".to_string()],
                description: "Build the matching engine.".to_string(),
                benefits: vec![],
            }),
            created_at: Utc::now(),
        }
    }

    fn profile(owner_id: Uuid) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            owner_id,
            details: ListingDetails::CandidateProfile(CandidateProfileDetails {
                headline: Some("Senior Backend Engineer".to_string()),
                location: "Berlin".to_string(),
                skills: vec!["Rust".to_string()],
                experience: Some("5 years".to_string()),
                availability: Availability::Immediately,
                bio: None,
                desired_salary: None,
            }),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn pair_normalizes_from_either_side() {
        let c = candidate(Uuid::new_v4());
        let f = company(Uuid::new_v4());

        let from_candidate = pair_for(&c, &job(f.id)).unwrap();
        let from_company = pair_for(&f, &profile(c.id)).unwrap();

        assert_eq!(from_candidate, from_company);
        assert_eq!(from_candidate.candidate_id, c.id);
        assert_eq!(from_candidate.company_id, f.id);
    }

    #[test]
    fn pair_rejects_same_side_swipes() {
        let c = candidate(Uuid::new_v4());
        let other_candidate = Uuid::new_v4();
        let err = pair_for(&c, &profile(other_candidate)).unwrap_err();
        assert!(matches!(err, PortError::InvalidSwipe(_)));

        let f = company(Uuid::new_v4());
        let err = pair_for(&f, &job(Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, PortError::InvalidSwipe(_)));
    }

    #[test]
    fn shuffle_rank_is_stable_per_seed() {
        let id = Uuid::new_v4();
        assert_eq!(shuffle_rank(42, id), shuffle_rank(42, id));
        // Different seeds produce a different permutation (overwhelmingly).
        let other = Uuid::new_v4();
        let same = shuffle_rank(1, id) == shuffle_rank(2, id)
            && shuffle_rank(1, other) == shuffle_rank(2, other);
        assert!(!same);
    }

    #[test]
    fn super_like_counts_as_interest() {
        assert!(SwipeDirection::Like.is_interested());
        assert!(SwipeDirection::SuperLike.is_interested());
        assert!(!SwipeDirection::Dislike.is_interested());
    }
}
