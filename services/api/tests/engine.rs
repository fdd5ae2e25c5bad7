//! Integration tests for the swipe engine over the in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use api_lib::adapters::MemoryStore;
use async_trait::async_trait;
use chrono::Utc;
use matchdeck_core::domain::{
    Actor, ActorRole, Availability, CandidateProfileDetails, EmploymentType, JobDetails, Listing,
    ListingDetails, Match, ReportReason, SwipeDirection,
};
use matchdeck_core::engine::SwipeEngine;
use matchdeck_core::ports::{MatchNotificationService, MatchingStore, PortError, PortResult};
use uuid::Uuid;

/// Counts deliveries so tests can assert exactly-once dispatch.
#[derive(Default)]
struct RecordingNotifier {
    delivered: AtomicUsize,
}

#[async_trait]
impl MatchNotificationService for RecordingNotifier {
    async fn notify_match(&self, _created: &Match) -> PortResult<()> {
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Harness {
    engine: SwipeEngine,
    notifier: Arc<RecordingNotifier>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = SwipeEngine::new(store, vec![notifier.clone()]);
    Harness { engine, notifier }
}

impl Harness {
    async fn candidate(&self, name: &str) -> Actor {
        self.engine
            .register_actor(Actor {
                id: Uuid::new_v4(),
                role: ActorRole::Candidate,
                display_name: name.to_string(),
            })
            .await
            .unwrap()
    }

    async fn company(&self, name: &str) -> Actor {
        self.engine
            .register_actor(Actor {
                id: Uuid::new_v4(),
                role: ActorRole::Company,
                display_name: name.to_string(),
            })
            .await
            .unwrap()
    }

    async fn job(&self, owner: &Actor, title: &str) -> Listing {
        self.engine
            .publish_listing(Listing {
                id: Uuid::new_v4(),
                owner_id: owner.id,
                details: ListingDetails::Job(JobDetails {
                    title: title.to_string(),
                    location: "Berlin".to_string(),
                    employment_type: EmploymentType::FullTime,
                    salary: Some("65k".to_string()),
                    required_skills: vec!["Rust".to_string()],
                    description: "Work on the matching engine.".to_string(),
                    benefits: vec![],
                }),
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    async fn profile(&self, owner: &Actor) -> Listing {
        self.engine
            .publish_listing(Listing {
                id: Uuid::new_v4(),
                owner_id: owner.id,
                details: ListingDetails::CandidateProfile(CandidateProfileDetails {
                    headline: Some("Backend Engineer".to_string()),
                    location: "Berlin".to_string(),
                    skills: vec!["Rust".to_string()],
                    experience: Some("4 years".to_string()),
                    availability: Availability::Immediately,
                    bio: None,
                    desired_salary: None,
                }),
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    async fn swipe(&self, viewer: &Actor, target: &Listing, direction: SwipeDirection) -> Option<Match> {
        self.engine
            .submit_swipe(viewer.id, target.id, direction, Utc::now())
            .await
            .unwrap()
            .created_match
    }
}

#[tokio::test]
async fn resubmitted_swipe_upserts_instead_of_duplicating() {
    let h = harness();
    let candidate = h.candidate("Anna").await;
    let company = h.company("Acme").await;
    let job = h.job(&company, "Backend Engineer").await;

    let first = h
        .engine
        .submit_swipe(candidate.id, job.id, SwipeDirection::Like, Utc::now())
        .await
        .unwrap()
        .swipe;
    let second = h
        .engine
        .submit_swipe(candidate.id, job.id, SwipeDirection::Dislike, Utc::now())
        .await
        .unwrap()
        .swipe;

    // Same record, direction equal to the second submission.
    assert_eq!(first.id, second.id);
    assert_eq!(second.direction, SwipeDirection::Dislike);
}

#[tokio::test]
async fn mutual_like_creates_exactly_one_match_and_notifies_once() {
    let h = harness();
    let candidate = h.candidate("Anna").await;
    let company = h.company("Acme").await;
    let job1 = h.job(&company, "Backend Engineer").await;
    let job2 = h.job(&company, "Platform Engineer").await;
    let profile = h.profile(&candidate).await;

    // C1 likes J1: F1 has not reciprocated, so no match yet.
    assert!(h.swipe(&candidate, &job1, SwipeDirection::Like).await.is_none());
    assert_eq!(h.notifier.delivered.load(Ordering::SeqCst), 0);

    // F1 likes C1's profile: reciprocity established, match created once.
    let created = h.swipe(&company, &profile, SwipeDirection::Like).await;
    let created = created.expect("mutual like should create a match");
    assert_eq!(created.candidate_id, candidate.id);
    assert_eq!(created.company_id, company.id);
    assert_eq!(h.notifier.delivered.load(Ordering::SeqCst), 1);

    // A like on a second job of the same company produces no new match.
    assert!(h.swipe(&candidate, &job2, SwipeDirection::Like).await.is_none());
    assert_eq!(h.notifier.delivered.load(Ordering::SeqCst), 1);

    // Both parties see exactly one match.
    assert_eq!(h.engine.matches_for(candidate.id).await.unwrap().len(), 1);
    assert_eq!(h.engine.matches_for(company.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn super_like_establishes_reciprocity() {
    let h = harness();
    let candidate = h.candidate("Anna").await;
    let company = h.company("Acme").await;
    let job = h.job(&company, "Backend Engineer").await;
    let profile = h.profile(&candidate).await;

    assert!(h.swipe(&candidate, &job, SwipeDirection::SuperLike).await.is_none());
    assert!(h.swipe(&company, &profile, SwipeDirection::Like).await.is_some());
}

#[tokio::test]
async fn dislike_never_triggers_match_evaluation() {
    let h = harness();
    let candidate = h.candidate("Anna").await;
    let company = h.company("Acme").await;
    let job = h.job(&company, "Backend Engineer").await;
    let profile = h.profile(&candidate).await;

    assert!(h.swipe(&candidate, &job, SwipeDirection::Dislike).await.is_none());
    // The company's like finds no reciprocal interest.
    assert!(h.swipe(&company, &profile, SwipeDirection::Like).await.is_none());
    assert_eq!(h.notifier.delivered.load(Ordering::SeqCst), 0);

    // Flipping the dislike to a like completes the pair.
    assert!(h.swipe(&candidate, &job, SwipeDirection::Like).await.is_some());
    assert_eq!(h.notifier.delivered.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_swipes_are_rejected() {
    let h = harness();
    let candidate = h.candidate("Anna").await;
    let other_candidate = h.candidate("Ben").await;
    let company = h.company("Acme").await;
    let job = h.job(&company, "Backend Engineer").await;
    let profile = h.profile(&candidate).await;

    // Nonexistent target.
    let err = h
        .engine
        .submit_swipe(candidate.id, Uuid::new_v4(), SwipeDirection::Like, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::InvalidSwipe(_)));

    // Self-swipe (owner of the target).
    let err = h
        .engine
        .submit_swipe(company.id, job.id, SwipeDirection::Like, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::InvalidSwipe(_)));

    // Same-side swipe: a candidate on another candidate's profile.
    let err = h
        .engine
        .submit_swipe(other_candidate.id, profile.id, SwipeDirection::Like, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::InvalidSwipe(_)));
}

#[tokio::test]
async fn queue_excludes_own_and_swiped_listings() {
    let h = harness();
    let candidate = h.candidate("Anna").await;
    let company_a = h.company("Acme").await;
    let company_b = h.company("Globex").await;
    let job_a = h.job(&company_a, "Backend Engineer").await;
    let job_b = h.job(&company_b, "Data Engineer").await;
    // The candidate's own profile must never show up in their queue.
    h.profile(&candidate).await;

    let page = h.engine.next_cards(candidate.id, 10, None, 0).await.unwrap();
    let ids: Vec<Uuid> = page.cards.iter().map(|c| c.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&job_a.id));
    assert!(ids.contains(&job_b.id));

    // After a swipe (either direction) the target never reappears.
    let _ = h.swipe(&candidate, &job_a, SwipeDirection::Dislike).await;
    let page = h
        .engine
        .next_cards(candidate.id, 10, Some(page.seed), 0)
        .await
        .unwrap();
    let ids: Vec<Uuid> = page.cards.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![job_b.id]);
}

#[tokio::test]
async fn queue_pagination_is_deterministic_within_a_session() {
    let h = harness();
    let candidate = h.candidate("Anna").await;
    for i in 0..8 {
        let company = h.company(&format!("Company {i}")).await;
        h.job(&company, "Engineer").await;
    }

    let first = h.engine.next_cards(candidate.id, 3, None, 0).await.unwrap();
    let second = h
        .engine
        .next_cards(candidate.id, 3, Some(first.seed), 3)
        .await
        .unwrap();
    let third = h
        .engine
        .next_cards(candidate.id, 3, Some(first.seed), 6)
        .await
        .unwrap();

    let mut all: Vec<Uuid> = first
        .cards
        .iter()
        .chain(second.cards.iter())
        .chain(third.cards.iter())
        .map(|c| c.id)
        .collect();
    assert_eq!(all.len(), 8);
    all.sort();
    all.dedup();
    // No duplicate delivery across pages of one session.
    assert_eq!(all.len(), 8);

    // Replaying a page with the same seed returns the same cards.
    let replay = h.engine.next_cards(candidate.id, 3, Some(first.seed), 0).await.unwrap();
    let first_ids: Vec<Uuid> = first.cards.iter().map(|c| c.id).collect();
    let replay_ids: Vec<Uuid> = replay.cards.iter().map(|c| c.id).collect();
    assert_eq!(first_ids, replay_ids);
}

#[tokio::test]
async fn rebuild_derives_matches_from_swipe_history_idempotently() {
    let h = harness();
    let candidate = h.candidate("Anna").await;
    let company = h.company("Acme").await;
    let job = h.job(&company, "Backend Engineer").await;
    let profile = h.profile(&candidate).await;

    // Mutual likes recorded, and the live path already created the match.
    let _ = h.swipe(&candidate, &job, SwipeDirection::Like).await;
    let _ = h.swipe(&company, &profile, SwipeDirection::Like).await;
    assert_eq!(h.engine.matches_for(candidate.id).await.unwrap().len(), 1);

    // Replaying detection over the same history creates nothing new.
    assert_eq!(h.engine.rebuild_matches(Utc::now()).await.unwrap(), 0);
    assert_eq!(h.engine.matches_for(candidate.id).await.unwrap().len(), 1);
    // Rebuild never notifies.
    assert_eq!(h.notifier.delivered.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rebuild_recovers_a_match_lost_after_the_swipe_write() {
    // Simulate a history where both interested swipes are durable but match
    // evaluation never ran: write the swipes through the store port directly.
    let store = Arc::new(MemoryStore::new());
    let engine = SwipeEngine::new(store.clone(), vec![]);
    let candidate = engine
        .register_actor(Actor {
            id: Uuid::new_v4(),
            role: ActorRole::Candidate,
            display_name: "Anna".to_string(),
        })
        .await
        .unwrap();
    let company = engine
        .register_actor(Actor {
            id: Uuid::new_v4(),
            role: ActorRole::Company,
            display_name: "Acme".to_string(),
        })
        .await
        .unwrap();
    let job = engine
        .publish_listing(Listing {
            id: Uuid::new_v4(),
            owner_id: company.id,
            details: ListingDetails::Job(JobDetails {
                title: "Backend Engineer".to_string(),
                location: "Berlin".to_string(),
                employment_type: EmploymentType::FullTime,
                salary: None,
                required_skills: vec!["Rust".to_string()],
                description: "Work on the matching engine.".to_string(),
                benefits: vec![],
            }),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    let profile = engine
        .publish_listing(Listing {
            id: Uuid::new_v4(),
            owner_id: candidate.id,
            details: ListingDetails::CandidateProfile(CandidateProfileDetails {
                headline: None,
                location: "Berlin".to_string(),
                skills: vec!["Rust".to_string()],
                experience: None,
                availability: Availability::Negotiable,
                bio: None,
                desired_salary: None,
            }),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    store
        .upsert_swipe(candidate.id, job.id, SwipeDirection::Like, Utc::now())
        .await
        .unwrap();
    store
        .upsert_swipe(company.id, profile.id, SwipeDirection::Like, Utc::now())
        .await
        .unwrap();

    assert!(engine.matches_for(candidate.id).await.unwrap().is_empty());
    assert_eq!(engine.rebuild_matches(Utc::now()).await.unwrap(), 1);
    assert_eq!(engine.matches_for(candidate.id).await.unwrap().len(), 1);
    // A second rebuild finds nothing missing.
    assert_eq!(engine.rebuild_matches(Utc::now()).await.unwrap(), 0);
}

#[tokio::test]
async fn concurrent_mutual_likes_create_a_single_match() {
    let h = harness();
    let candidate = h.candidate("Anna").await;
    let company = h.company("Acme").await;
    let job = h.job(&company, "Backend Engineer").await;
    let profile = h.profile(&candidate).await;

    let engine_a = h.engine.clone();
    let engine_b = h.engine.clone();
    let (c_id, j_id) = (candidate.id, job.id);
    let (f_id, p_id) = (company.id, profile.id);
    let (a, b) = tokio::join!(
        tokio::spawn(async move {
            engine_a
                .submit_swipe(c_id, j_id, SwipeDirection::Like, Utc::now())
                .await
        }),
        tokio::spawn(async move {
            engine_b
                .submit_swipe(f_id, p_id, SwipeDirection::Like, Utc::now())
                .await
        }),
    );
    a.unwrap().unwrap();
    b.unwrap().unwrap();

    // However the two interleaved, exactly one match exists afterwards and
    // exactly one side announced it.
    assert_eq!(h.engine.matches_for(candidate.id).await.unwrap().len(), 1);
    assert_eq!(h.notifier.delivered.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn reports_are_recorded_for_existing_listings() {
    let h = harness();
    let candidate = h.candidate("Anna").await;
    let company = h.company("Acme").await;
    let job = h.job(&company, "Backend Engineer").await;

    let report = h
        .engine
        .report_listing(
            candidate.id,
            job.id,
            ReportReason::Spam,
            Some("Reposted daily".to_string()),
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(report.listing_id, job.id);

    let err = h
        .engine
        .report_listing(candidate.id, Uuid::new_v4(), ReportReason::Fake, None, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
}
