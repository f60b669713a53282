use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::calculator;
use super::domain::{AffinityRecord, AffinitySource, PersonId, PracticeVersionId};
use super::error::{EngineError, ValidationError};
use super::repository::{AffinityRepository, CatalogRepository, PeopleRepository, ProfileRepository};

/// Persists calculated and manual affinity rows.
pub struct AffinityStore<S> {
    store: Arc<S>,
}

impl<S> Clone for AffinityStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> AffinityStore<S>
where
    S: PeopleRepository + ProfileRepository + CatalogRepository + AffinityRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Rescores every practice version for the person in one batch. A missing or
    /// incomplete profile is a no-op.
    pub fn recalculate_for_person(
        &self,
        person_id: PersonId,
    ) -> Result<Vec<AffinityRecord>, EngineError> {
        let Some(profile) = self.store.fetch_profile(person_id)? else {
            debug!(%person_id, "no trait profile; skipping affinity recalculation");
            return Ok(Vec::new());
        };
        let Some(traits) = profile.big_five() else {
            debug!(%person_id, "trait profile incomplete; skipping affinity recalculation");
            return Ok(Vec::new());
        };

        let now = Utc::now();
        let records: Vec<AffinityRecord> = self
            .store
            .practice_versions()?
            .into_iter()
            .map(|entry| AffinityRecord {
                person_id,
                practice_version_id: entry.id(),
                score: calculator::score(&traits, &entry.practice),
                source: AffinitySource::Calculated,
                updated_at: now,
            })
            .collect();

        let stored = self
            .store
            .upsert_affinity_batch(person_id, records)
            .map_err(|source| EngineError::Transaction { person_id, source })?;

        info!(%person_id, practices = stored.len(), "affinities recalculated");
        Ok(stored)
    }

    pub fn get(
        &self,
        person_id: PersonId,
        practice_version_id: PracticeVersionId,
    ) -> Result<Option<AffinityRecord>, EngineError> {
        Ok(self.store.affinity(person_id, practice_version_id)?)
    }

    pub fn all_for_person(&self, person_id: PersonId) -> Result<Vec<AffinityRecord>, EngineError> {
        Ok(self.store.affinities_for_person(person_id)?)
    }

    pub fn all_for_practice(
        &self,
        practice_version_id: PracticeVersionId,
    ) -> Result<Vec<AffinityRecord>, EngineError> {
        Ok(self.store.affinities_for_practice(practice_version_id)?)
    }

    /// Stores an operator-supplied score, bypassing the calculator.
    pub fn upsert_manual(
        &self,
        person_id: PersonId,
        practice_version_id: PracticeVersionId,
        score: i64,
    ) -> Result<AffinityRecord, EngineError> {
        let score = u8::try_from(score)
            .ok()
            .filter(|score| *score <= 100)
            .ok_or(ValidationError::ScoreOutOfRange(score))?;

        if !self.store.person_exists(person_id)? {
            return Err(EngineError::not_found("person", person_id.0));
        }
        if self.store.practice_version(practice_version_id)?.is_none() {
            return Err(EngineError::not_found(
                "practice version",
                practice_version_id.0,
            ));
        }

        let record = self.store.upsert_affinity(AffinityRecord {
            person_id,
            practice_version_id,
            score,
            source: AffinitySource::Manual,
            updated_at: Utc::now(),
        })?;
        info!(%person_id, %practice_version_id, score, "manual affinity stored");
        Ok(record)
    }
}
