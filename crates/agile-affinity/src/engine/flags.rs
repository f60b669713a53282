use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::alternatives::{Alternative, AlternativeMatcher};
use super::domain::{ContextId, DifficultyFlag, PersonId, PracticeVersionId};
use super::error::EngineError;
use super::repository::{AffinityRepository, CatalogRepository, FlagRepository, PeopleRepository};

const TEAM_FLAG_ALTERNATIVES: usize = 3;

/// Practice reported as difficult by one or more team members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedPractice {
    pub practice_version_id: PracticeVersionId,
    pub practice_name: String,
    pub flag_count: usize,
    pub flagged_by: Vec<PersonId>,
    pub reasons: Vec<String>,
    pub alternatives: Vec<Alternative>,
}

pub struct DifficultyFlagRegistry<S> {
    store: Arc<S>,
    matcher: AlternativeMatcher<S>,
}

impl<S> Clone for DifficultyFlagRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            matcher: self.matcher.clone(),
        }
    }
}

impl<S> DifficultyFlagRegistry<S>
where
    S: PeopleRepository + CatalogRepository + AffinityRepository + FlagRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        let matcher = AlternativeMatcher::new(Arc::clone(&store));
        Self { store, matcher }
    }

    /// Records (or replaces) the person's flag for the practice.
    pub fn flag(
        &self,
        person_id: PersonId,
        practice_version_id: PracticeVersionId,
        reason: Option<String>,
        context_id: Option<ContextId>,
    ) -> Result<DifficultyFlag, EngineError> {
        if !self.store.person_exists(person_id)? {
            return Err(EngineError::not_found("person", person_id.0));
        }
        if self.store.practice_version(practice_version_id)?.is_none() {
            return Err(EngineError::not_found(
                "practice version",
                practice_version_id.0,
            ));
        }

        let reason = reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());
        let flag = self.store.upsert_flag(DifficultyFlag {
            person_id,
            practice_version_id,
            reason,
            context_id,
            flagged_at: Utc::now(),
        })?;
        info!(%person_id, %practice_version_id, "practice flagged as difficult");
        Ok(flag)
    }

    /// Flagged practices across the team, most-flagged first, each with its
    /// top alternatives for the same team beating it by more than
    /// `min_improvement` points.
    pub fn flagged_for_team(
        &self,
        person_ids: &[PersonId],
        min_improvement: f64,
    ) -> Result<Vec<FlaggedPractice>, EngineError> {
        let mut grouped: BTreeMap<PracticeVersionId, Vec<DifficultyFlag>> = BTreeMap::new();
        for flag in self.store.flags_for_persons(person_ids)? {
            grouped
                .entry(flag.practice_version_id)
                .or_default()
                .push(flag);
        }

        let mut flagged = Vec::with_capacity(grouped.len());
        for (practice_version_id, flags) in grouped {
            let entry = self
                .store
                .practice_version(practice_version_id)?
                .ok_or_else(|| {
                    EngineError::not_found("practice version", practice_version_id.0)
                })?;
            let mut alternatives = self.matcher.find_alternatives(
                practice_version_id,
                person_ids,
                min_improvement,
            )?;
            alternatives.truncate(TEAM_FLAG_ALTERNATIVES);

            flagged.push(FlaggedPractice {
                practice_version_id,
                practice_name: entry.name().to_string(),
                flag_count: flags.len(),
                flagged_by: flags.iter().map(|flag| flag.person_id).collect(),
                reasons: flags.iter().filter_map(|flag| flag.reason.clone()).collect(),
                alternatives,
            });
        }

        flagged.sort_by(|a, b| {
            b.flag_count
                .cmp(&a.flag_count)
                .then(a.practice_version_id.cmp(&b.practice_version_id))
        });
        Ok(flagged)
    }
}
