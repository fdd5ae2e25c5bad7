pub mod domain;
pub mod engine;
pub mod ports;

pub use domain::{
    Actor, ActorRole, Listing, ListingDetails, ListingKind, Match, MatchPair, Report,
    ReportReason, Swipe, SwipeDirection,
};
pub use engine::{CardPage, SwipeEngine, SwipeOutcome};
pub use ports::{MatchNotificationService, MatchingStore, PortError, PortResult};
