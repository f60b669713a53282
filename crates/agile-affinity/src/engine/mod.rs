//! Affinity scoring and recommendation engine.
//!
//! Survey answers become a trait profile, complete profiles are scored against
//! every practice version, and team-level statistics drive recommendations,
//! difficulty reports, and objective-preserving alternatives. Storage is
//! abstracted behind the traits in [`repository`].

pub mod affinities;
pub mod alternatives;
pub mod calculator;
pub mod domain;
mod error;
pub mod flags;
pub mod memory;
pub mod recalc;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;
pub mod survey;
pub mod team;

#[cfg(test)]
mod tests;

pub use affinities::AffinityStore;
pub use alternatives::{Alternative, AlternativeMatcher, DEFAULT_MIN_IMPROVEMENT};
pub use calculator::{
    AffinityBreakdown, PracticeCharacteristics, COLLABORATIVE_CATEGORY, STRUCTURED_CATEGORY,
};
pub use domain::{
    AffinityRecord, AffinitySource, BigFive, ContextId, DifficultyFlag, Goal, GoalId, PersonId,
    Practice, PracticeEntry, PracticeId, PracticeTypeId, PracticeVersion, PracticeVersionId,
    ProfileCompleteness, ProfileStatus, Recommendation, RecommendationId, RecommendationKind,
    TeamId, TraitDimension, TraitProfile, TraitScores,
};
pub use error::{EngineError, ValidationError};
pub use flags::{DifficultyFlagRegistry, FlaggedPractice};
pub use memory::{InMemoryStore, InMemoryStoreBuilder};
pub use recalc::{RecalculationQueue, RecalculationTicket};
pub use report::{
    ContextRecommendation, RecommendationReport, ReplacementSuggestion, ReportBuilder,
    ReportOptions, ReportSummary,
};
pub use repository::{
    AffinityRepository, CatalogRepository, EngineStore, FlagRepository, PeopleRepository,
    ProfileRepository, RepositoryError,
};
pub use router::engine_router;
pub use service::{AffinityService, SurveySubmission, TeamSelector};
pub use survey::{survey_items, SurveyAnswer, SurveyItem};
pub use team::{
    MemberAffinity, PracticeStanding, RankedPractice, TeamAffinityStats, TeamAggregator,
    LOW_AFFINITY_THRESHOLD,
};
