//! crates/matchdeck_core/src/domain.rs
//!
//! Defines the pure, core data structures for the matching engine.
//! These structs are independent of any database or wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two populations that swipe on each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Candidate,
    Company,
}

/// A participant in the marketplace. Actors are owned by the upstream
/// account system; the engine only mirrors the fields it needs.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
    pub display_name: String,
}

/// Discriminates the two kinds of swipeable listings without resorting
/// to role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    Job,
    CandidateProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Freelance,
    Internship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Immediately,
    OneMonth,
    ThreeMonths,
    Negotiable,
}

/// Display attributes of a job posting, as shown to candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDetails {
    pub title: String,
    pub location: String,
    pub employment_type: EmploymentType,
    pub salary: Option<String>,
    pub required_skills: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub benefits: Vec<String>,
}

/// Display attributes of a candidate profile, as shown to companies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfileDetails {
    pub headline: Option<String>,
    pub location: String,
    pub skills: Vec<String>,
    pub experience: Option<String>,
    pub availability: Availability,
    pub bio: Option<String>,
    pub desired_salary: Option<String>,
}

/// The role-specific payload of a listing, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListingDetails {
    Job(JobDetails),
    CandidateProfile(CandidateProfileDetails),
}

impl ListingDetails {
    pub fn kind(&self) -> ListingKind {
        match self {
            ListingDetails::Job(_) => ListingKind::Job,
            ListingDetails::CandidateProfile(_) => ListingKind::CandidateProfile,
        }
    }
}

/// A swipeable unit: either a Job owned by a Company, or a Candidate
/// Profile owned by a Candidate. Immutable once created; edits upstream
/// create no new swipe history.
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub details: ListingDetails,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn kind(&self) -> ListingKind {
        self.details.kind()
    }
}

/// The decision an actor expressed on one card. `SuperLike` is the
/// client's upward swipe and counts as interest exactly like `Like`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Like,
    Dislike,
    SuperLike,
}

impl SwipeDirection {
    /// Whether this direction expresses interest for reciprocity purposes.
    pub fn is_interested(self) -> bool {
        matches!(self, SwipeDirection::Like | SwipeDirection::SuperLike)
    }
}

/// One actor's decision on one listing. At most one per (viewer, target)
/// pair; a resubmission overwrites the prior direction.
#[derive(Debug, Clone)]
pub struct Swipe {
    pub id: Uuid,
    pub viewer_id: Uuid,
    pub target_id: Uuid,
    pub direction: SwipeDirection,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The normalized identity of a potential match, independent of which
/// side swiped last or how many listings were involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchPair {
    pub candidate_id: Uuid,
    pub company_id: Uuid,
}

/// Mutually-confirmed interest between a candidate and a company.
/// At most one per (candidate, company) pair, created the first time
/// reciprocity is detected.
#[derive(Debug, Clone)]
pub struct Match {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub company_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn pair(&self) -> MatchPair {
        MatchPair {
            candidate_id: self.candidate_id,
            company_id: self.company_id,
        }
    }

    pub fn involves(&self, actor_id: Uuid) -> bool {
        self.candidate_id == actor_id || self.company_id == actor_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Inappropriate,
    Fake,
    Spam,
    Other,
}

/// A complaint about a listing. The engine records these for the upstream
/// moderation pipeline and does nothing else with them.
#[derive(Debug, Clone)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub listing_id: Uuid,
    pub reason: ReportReason,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}
