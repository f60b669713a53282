use std::collections::BTreeSet;

use super::domain::{
    AffinityRecord, DifficultyFlag, Goal, GoalId, PersonId, PracticeEntry, PracticeVersionId,
    Recommendation, TeamId, TraitProfile,
};

/// Directory of known persons and team memberships.
pub trait PeopleRepository: Send + Sync {
    fn person_exists(&self, person_id: PersonId) -> Result<bool, RepositoryError>;
    fn team_members(&self, team_id: TeamId) -> Result<Option<Vec<PersonId>>, RepositoryError>;
}

/// Storage for trait profiles, one per person.
pub trait ProfileRepository: Send + Sync {
    fn fetch_profile(&self, person_id: PersonId) -> Result<Option<TraitProfile>, RepositoryError>;
    fn save_profile(&self, profile: TraitProfile) -> Result<TraitProfile, RepositoryError>;
}

/// Read-only view over practices, goals, and the recommendations linking them.
pub trait CatalogRepository: Send + Sync {
    fn practice_versions(&self) -> Result<Vec<PracticeEntry>, RepositoryError>;
    fn practice_version(
        &self,
        id: PracticeVersionId,
    ) -> Result<Option<PracticeEntry>, RepositoryError>;
    fn recommendations(&self) -> Result<Vec<Recommendation>, RepositoryError>;
    fn goals(&self, ids: &BTreeSet<GoalId>) -> Result<Vec<Goal>, RepositoryError>;
}

/// Affinity rows keyed by `(person, practice version)`.
pub trait AffinityRepository: Send + Sync {
    fn affinity(
        &self,
        person_id: PersonId,
        practice_version_id: PracticeVersionId,
    ) -> Result<Option<AffinityRecord>, RepositoryError>;
    fn affinities_for_person(
        &self,
        person_id: PersonId,
    ) -> Result<Vec<AffinityRecord>, RepositoryError>;
    fn affinities_for_practice(
        &self,
        practice_version_id: PracticeVersionId,
    ) -> Result<Vec<AffinityRecord>, RepositoryError>;
    fn upsert_affinity(&self, record: AffinityRecord) -> Result<AffinityRecord, RepositoryError>;
    /// Upserts every record in one transaction; on error none of them are visible.
    fn upsert_affinity_batch(
        &self,
        person_id: PersonId,
        records: Vec<AffinityRecord>,
    ) -> Result<Vec<AffinityRecord>, RepositoryError>;
}

/// Difficulty flags keyed by `(person, practice version)`.
pub trait FlagRepository: Send + Sync {
    fn upsert_flag(&self, flag: DifficultyFlag) -> Result<DifficultyFlag, RepositoryError>;
    fn flags_for_persons(
        &self,
        person_ids: &[PersonId],
    ) -> Result<Vec<DifficultyFlag>, RepositoryError>;
}

/// Everything the engine needs from the datastore.
pub trait EngineStore:
    PeopleRepository + ProfileRepository + CatalogRepository + AffinityRepository + FlagRepository
{
}

impl<T> EngineStore for T where
    T: PeopleRepository
        + ProfileRepository
        + CatalogRepository
        + AffinityRepository
        + FlagRepository
{
}

/// Error enumeration for datastore failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("record conflicts with existing data: {0}")]
    Conflict(String),
    #[error("transaction aborted: {0}")]
    Transaction(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
