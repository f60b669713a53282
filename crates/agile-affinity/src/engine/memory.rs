use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use super::domain::{
    AffinityRecord, DifficultyFlag, Goal, GoalId, PersonId, PracticeEntry, PracticeVersionId,
    Recommendation, TeamId, TraitProfile,
};
use super::repository::{
    AffinityRepository, CatalogRepository, FlagRepository, PeopleRepository, ProfileRepository,
    RepositoryError,
};

#[derive(Debug, Default, Clone)]
struct StoreState {
    persons: BTreeSet<PersonId>,
    teams: BTreeMap<TeamId, Vec<PersonId>>,
    profiles: BTreeMap<PersonId, TraitProfile>,
    practices: BTreeMap<PracticeVersionId, PracticeEntry>,
    goals: BTreeMap<GoalId, Goal>,
    recommendations: Vec<Recommendation>,
    affinities: BTreeMap<(PersonId, PracticeVersionId), AffinityRecord>,
    flags: BTreeMap<(PersonId, PracticeVersionId), DifficultyFlag>,
}

impl StoreState {
    fn check_affinity(&self, record: &AffinityRecord) -> Result<(), RepositoryError> {
        if !self.persons.contains(&record.person_id) {
            return Err(RepositoryError::Conflict(format!(
                "unknown person {}",
                record.person_id
            )));
        }
        if !self.practices.contains_key(&record.practice_version_id) {
            return Err(RepositoryError::Conflict(format!(
                "unknown practice version {}",
                record.practice_version_id
            )));
        }
        if record.score > 100 {
            return Err(RepositoryError::Conflict(format!(
                "affinity {} exceeds 100",
                record.score
            )));
        }
        Ok(())
    }
}

/// Process-local datastore enforcing the same keys and integrity rules as the
/// relational schema. Each call holds the lock for its whole duration, which
/// gives affinity batches all-or-nothing visibility.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    pub fn affinity_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.state()?.affinities.len())
    }

    pub fn flag_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.state()?.flags.len())
    }
}

/// Seeds catalog, people, and teams before the store is shared.
#[derive(Debug, Default)]
pub struct InMemoryStoreBuilder {
    state: StoreState,
}

impl InMemoryStoreBuilder {
    pub fn person(mut self, person_id: PersonId) -> Self {
        self.state.persons.insert(person_id);
        self
    }

    pub fn team(mut self, team_id: TeamId, members: Vec<PersonId>) -> Self {
        self.state.persons.extend(members.iter().copied());
        self.state.teams.insert(team_id, members);
        self
    }

    pub fn practice(mut self, entry: PracticeEntry) -> Self {
        self.state.practices.insert(entry.id(), entry);
        self
    }

    pub fn goal(mut self, goal: Goal) -> Self {
        self.state.goals.insert(goal.id, goal);
        self
    }

    pub fn recommendation(mut self, recommendation: Recommendation) -> Self {
        self.state.recommendations.push(recommendation);
        self
    }

    pub fn profile(mut self, profile: TraitProfile) -> Self {
        self.state.persons.insert(profile.person_id);
        self.state.profiles.insert(profile.person_id, profile);
        self
    }

    pub fn affinity(mut self, record: AffinityRecord) -> Self {
        self.state
            .affinities
            .insert((record.person_id, record.practice_version_id), record);
        self
    }

    pub fn build(self) -> InMemoryStore {
        InMemoryStore {
            state: Mutex::new(self.state),
        }
    }
}

impl PeopleRepository for InMemoryStore {
    fn person_exists(&self, person_id: PersonId) -> Result<bool, RepositoryError> {
        Ok(self.state()?.persons.contains(&person_id))
    }

    fn team_members(&self, team_id: TeamId) -> Result<Option<Vec<PersonId>>, RepositoryError> {
        Ok(self.state()?.teams.get(&team_id).cloned())
    }
}

impl ProfileRepository for InMemoryStore {
    fn fetch_profile(&self, person_id: PersonId) -> Result<Option<TraitProfile>, RepositoryError> {
        Ok(self.state()?.profiles.get(&person_id).cloned())
    }

    fn save_profile(&self, profile: TraitProfile) -> Result<TraitProfile, RepositoryError> {
        let mut state = self.state()?;
        if !state.persons.contains(&profile.person_id) {
            return Err(RepositoryError::Conflict(format!(
                "unknown person {}",
                profile.person_id
            )));
        }
        state.profiles.insert(profile.person_id, profile.clone());
        Ok(profile)
    }
}

impl CatalogRepository for InMemoryStore {
    fn practice_versions(&self) -> Result<Vec<PracticeEntry>, RepositoryError> {
        Ok(self.state()?.practices.values().cloned().collect())
    }

    fn practice_version(
        &self,
        id: PracticeVersionId,
    ) -> Result<Option<PracticeEntry>, RepositoryError> {
        Ok(self.state()?.practices.get(&id).cloned())
    }

    fn recommendations(&self) -> Result<Vec<Recommendation>, RepositoryError> {
        Ok(self.state()?.recommendations.clone())
    }

    fn goals(&self, ids: &BTreeSet<GoalId>) -> Result<Vec<Goal>, RepositoryError> {
        let state = self.state()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.goals.get(id).cloned())
            .collect())
    }
}

impl AffinityRepository for InMemoryStore {
    fn affinity(
        &self,
        person_id: PersonId,
        practice_version_id: PracticeVersionId,
    ) -> Result<Option<AffinityRecord>, RepositoryError> {
        Ok(self
            .state()?
            .affinities
            .get(&(person_id, practice_version_id))
            .cloned())
    }

    fn affinities_for_person(
        &self,
        person_id: PersonId,
    ) -> Result<Vec<AffinityRecord>, RepositoryError> {
        Ok(self
            .state()?
            .affinities
            .values()
            .filter(|record| record.person_id == person_id)
            .cloned()
            .collect())
    }

    fn affinities_for_practice(
        &self,
        practice_version_id: PracticeVersionId,
    ) -> Result<Vec<AffinityRecord>, RepositoryError> {
        Ok(self
            .state()?
            .affinities
            .values()
            .filter(|record| record.practice_version_id == practice_version_id)
            .cloned()
            .collect())
    }

    fn upsert_affinity(&self, record: AffinityRecord) -> Result<AffinityRecord, RepositoryError> {
        let mut state = self.state()?;
        state.check_affinity(&record)?;
        state
            .affinities
            .insert((record.person_id, record.practice_version_id), record.clone());
        Ok(record)
    }

    fn upsert_affinity_batch(
        &self,
        person_id: PersonId,
        records: Vec<AffinityRecord>,
    ) -> Result<Vec<AffinityRecord>, RepositoryError> {
        let mut state = self.state()?;
        for record in &records {
            if record.person_id != person_id {
                return Err(RepositoryError::Transaction(format!(
                    "record for person {} in batch for person {person_id}",
                    record.person_id
                )));
            }
            state
                .check_affinity(record)
                .map_err(|err| RepositoryError::Transaction(err.to_string()))?;
        }

        for record in &records {
            state
                .affinities
                .insert((record.person_id, record.practice_version_id), record.clone());
        }
        Ok(records)
    }
}

impl FlagRepository for InMemoryStore {
    fn upsert_flag(&self, flag: DifficultyFlag) -> Result<DifficultyFlag, RepositoryError> {
        let mut state = self.state()?;
        if !state.persons.contains(&flag.person_id) {
            return Err(RepositoryError::Conflict(format!(
                "unknown person {}",
                flag.person_id
            )));
        }
        if !state.practices.contains_key(&flag.practice_version_id) {
            return Err(RepositoryError::Conflict(format!(
                "unknown practice version {}",
                flag.practice_version_id
            )));
        }
        state
            .flags
            .insert((flag.person_id, flag.practice_version_id), flag.clone());
        Ok(flag)
    }

    fn flags_for_persons(
        &self,
        person_ids: &[PersonId],
    ) -> Result<Vec<DifficultyFlag>, RepositoryError> {
        let wanted: BTreeSet<PersonId> = person_ids.iter().copied().collect();
        Ok(self
            .state()?
            .flags
            .values()
            .filter(|flag| wanted.contains(&flag.person_id))
            .cloned()
            .collect())
    }
}
