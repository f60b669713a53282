use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::affinities::AffinityStore;
use super::alternatives::{Alternative, AlternativeMatcher};
use super::domain::{
    AffinityRecord, ContextId, DifficultyFlag, PersonId, PracticeVersionId, TeamId, TraitProfile,
    TraitScores,
};
use super::error::{EngineError, ValidationError};
use super::flags::{DifficultyFlagRegistry, FlaggedPractice};
use super::recalc::{RecalculationQueue, RecalculationTicket};
use super::report::{RecommendationReport, ReportBuilder, ReportOptions};
use super::repository::EngineStore;
use super::survey::{self, SurveyAnswer};
use super::team::{
    MemberAffinity, RankedPractice, TeamAffinityStats, TeamAggregator, LOW_AFFINITY_THRESHOLD,
};
use crate::config::EngineConfig;

/// Identifies a team either by id or by an explicit member list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSelector {
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub person_ids: Vec<PersonId>,
}

/// Result of a survey submission.
#[derive(Debug)]
pub struct SurveySubmission {
    pub profile: TraitProfile,
    /// Dimension scores derived from this submission alone.
    pub scores: TraitScores,
    /// Present when the merged profile is complete and a recalculation was queued.
    pub recalculation: Option<RecalculationTicket>,
}

/// Facade exposing the engine's operations to the HTTP layer and CLI.
pub struct AffinityService<S> {
    store: Arc<S>,
    affinities: AffinityStore<S>,
    aggregator: TeamAggregator<S>,
    matcher: AlternativeMatcher<S>,
    flags: DifficultyFlagRegistry<S>,
    reports: ReportBuilder<S>,
    queue: RecalculationQueue,
    config: EngineConfig,
}

impl<S> AffinityService<S>
where
    S: EngineStore + 'static,
{
    /// Must be called from within a tokio runtime; the recalculation worker is
    /// spawned here.
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        let affinities = AffinityStore::new(Arc::clone(&store));
        let queue = RecalculationQueue::spawn(affinities.clone());
        Self {
            aggregator: TeamAggregator::new(Arc::clone(&store)),
            matcher: AlternativeMatcher::new(Arc::clone(&store)),
            flags: DifficultyFlagRegistry::new(Arc::clone(&store)),
            reports: ReportBuilder::new(Arc::clone(&store)),
            affinities,
            queue,
            store,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scores the answers, merges them into the person's profile, and queues an
    /// affinity recalculation whenever the stored profile is complete. The
    /// call returns once the profile is saved; recalculation failures never
    /// surface here.
    pub fn submit_survey(
        &self,
        person_id: PersonId,
        answers: &[SurveyAnswer],
    ) -> Result<SurveySubmission, EngineError> {
        let scores = survey::score_answers(answers)?;
        self.ensure_person(person_id)?;

        let now = Utc::now();
        let profile = match self.store.fetch_profile(person_id)? {
            Some(mut profile) => {
                profile.apply(&scores, now);
                profile
            }
            None => TraitProfile::new(person_id, scores, now),
        };
        let profile = self.store.save_profile(profile)?;
        info!(%person_id, status = ?profile.status, answers = answers.len(), "survey recorded");

        let recalculation = if profile.is_complete() {
            debug!(%person_id, "queueing affinity recalculation");
            Some(self.queue.submit(person_id))
        } else {
            None
        };

        Ok(SurveySubmission {
            profile,
            scores,
            recalculation,
        })
    }

    pub fn recalculate_affinities(
        &self,
        person_id: PersonId,
    ) -> Result<Vec<AffinityRecord>, EngineError> {
        self.ensure_person(person_id)?;
        self.affinities.recalculate_for_person(person_id)
    }

    pub fn affinity(
        &self,
        person_id: PersonId,
        practice_version_id: PracticeVersionId,
    ) -> Result<Option<AffinityRecord>, EngineError> {
        self.affinities.get(person_id, practice_version_id)
    }

    pub fn affinities_for_person(
        &self,
        person_id: PersonId,
    ) -> Result<Vec<AffinityRecord>, EngineError> {
        self.ensure_person(person_id)?;
        self.affinities.all_for_person(person_id)
    }

    pub fn affinities_for_practice(
        &self,
        practice_version_id: PracticeVersionId,
    ) -> Result<Vec<AffinityRecord>, EngineError> {
        self.ensure_practice(practice_version_id)?;
        self.affinities.all_for_practice(practice_version_id)
    }

    pub fn set_manual_affinity(
        &self,
        person_id: PersonId,
        practice_version_id: PracticeVersionId,
        score: i64,
    ) -> Result<AffinityRecord, EngineError> {
        self.affinities
            .upsert_manual(person_id, practice_version_id, score)
    }

    pub fn team_affinity(
        &self,
        person_ids: &[PersonId],
        practice_version_id: PracticeVersionId,
    ) -> Result<TeamAffinityStats, EngineError> {
        self.ensure_persons(person_ids)?;
        self.ensure_practice(practice_version_id)?;
        self.aggregator.team_affinity(person_ids, practice_version_id)
    }

    pub fn low_affinity_members(
        &self,
        person_ids: &[PersonId],
        practice_version_id: PracticeVersionId,
        threshold: Option<u8>,
    ) -> Result<Vec<MemberAffinity>, EngineError> {
        self.ensure_persons(person_ids)?;
        self.ensure_practice(practice_version_id)?;
        self.aggregator.low_affinity_members(
            person_ids,
            practice_version_id,
            threshold.unwrap_or(LOW_AFFINITY_THRESHOLD),
        )
    }

    pub fn team_recommendations(
        &self,
        person_ids: &[PersonId],
        min_threshold: Option<u8>,
    ) -> Result<Vec<RankedPractice>, EngineError> {
        let threshold = self.threshold(min_threshold)?;
        self.ensure_persons(person_ids)?;
        self.aggregator.team_recommendations(person_ids, threshold)
    }

    pub fn find_alternatives(
        &self,
        practice_version_id: PracticeVersionId,
        person_ids: &[PersonId],
        min_improvement: Option<f64>,
    ) -> Result<Vec<Alternative>, EngineError> {
        self.ensure_persons(person_ids)?;
        self.matcher.find_alternatives(
            practice_version_id,
            person_ids,
            min_improvement.unwrap_or(self.config.default_min_improvement),
        )
    }

    pub fn flag_difficulty(
        &self,
        person_id: PersonId,
        practice_version_id: PracticeVersionId,
        reason: Option<String>,
        context_id: Option<ContextId>,
    ) -> Result<DifficultyFlag, EngineError> {
        self.flags
            .flag(person_id, practice_version_id, reason, context_id)
    }

    pub fn flagged_for_team(
        &self,
        person_ids: &[PersonId],
    ) -> Result<Vec<FlaggedPractice>, EngineError> {
        self.ensure_persons(person_ids)?;
        self.flags
            .flagged_for_team(person_ids, self.config.default_min_improvement)
    }

    pub fn comprehensive_report(
        &self,
        person_ids: &[PersonId],
        options: ReportOptions,
    ) -> Result<RecommendationReport, EngineError> {
        let options = ReportOptions {
            min_affinity_threshold: Some(self.threshold(options.min_affinity_threshold)?),
            min_improvement: Some(
                options
                    .min_improvement
                    .unwrap_or(self.config.default_min_improvement),
            ),
            ..options
        };
        self.ensure_persons(person_ids)?;
        self.reports.comprehensive_report(person_ids, &options)
    }

    /// Resolves a selector to its member list; a team id takes precedence.
    pub fn resolve_team(&self, selector: &TeamSelector) -> Result<Vec<PersonId>, EngineError> {
        match selector.team_id {
            Some(team_id) => self
                .store
                .team_members(team_id)?
                .ok_or_else(|| EngineError::not_found("team", team_id.0)),
            None if !selector.person_ids.is_empty() => Ok(selector.person_ids.clone()),
            None => Err(ValidationError::MissingTeamSelector.into()),
        }
    }

    fn threshold(&self, requested: Option<u8>) -> Result<u8, EngineError> {
        let threshold = requested.unwrap_or(self.config.default_min_threshold);
        if threshold > 100 {
            return Err(ValidationError::ThresholdOutOfRange(threshold).into());
        }
        Ok(threshold)
    }

    fn ensure_person(&self, person_id: PersonId) -> Result<(), EngineError> {
        if self.store.person_exists(person_id)? {
            Ok(())
        } else {
            Err(EngineError::not_found("person", person_id.0))
        }
    }

    fn ensure_persons(&self, person_ids: &[PersonId]) -> Result<(), EngineError> {
        person_ids
            .iter()
            .try_for_each(|person_id| self.ensure_person(*person_id))
    }

    fn ensure_practice(&self, practice_version_id: PracticeVersionId) -> Result<(), EngineError> {
        match self.store.practice_version(practice_version_id)? {
            Some(_) => Ok(()),
            None => Err(EngineError::not_found(
                "practice version",
                practice_version_id.0,
            )),
        }
    }
}
