//! Substitutes for practices a team struggles with.
//!
//! A candidate must serve at least 70% of the original practice's goals and
//! beat the team's current average affinity by more than the requested margin.
//! Candidates are ranked by improvement, then by ascending practice version id.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{Goal, GoalId, PersonId, PracticeVersionId, Recommendation, RecommendationKind};
use super::error::{EngineError, ValidationError};
use super::repository::{AffinityRepository, CatalogRepository};
use super::team::{round_to_hundredths, TeamAffinityStats, TeamAggregator};

/// Default margin (in affinity points) an alternative must exceed.
pub const DEFAULT_MIN_IMPROVEMENT: f64 = 10.0;

const GOAL_OVERLAP_NUMERATOR: usize = 7;
const GOAL_OVERLAP_DENOMINATOR: usize = 10;

/// Smallest number of shared goals a candidate needs: `ceil(0.7 * goal_count)`,
/// computed in integers so that e.g. ten goals require seven rather than eight.
pub fn required_goal_overlap(goal_count: usize) -> usize {
    (goal_count * GOAL_OVERLAP_NUMERATOR).div_ceil(GOAL_OVERLAP_DENOMINATOR)
}

/// Practice that preserves the original's objectives with better team affinity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub practice_version_id: PracticeVersionId,
    pub practice_name: String,
    pub shared_goals: Vec<Goal>,
    pub current_average: f64,
    pub stats: TeamAffinityStats,
    pub affinity_improvement: f64,
    pub reason: String,
}

/// Goals each practice is recommended as helpful for.
pub(crate) fn goals_by_practice(
    recommendations: &[Recommendation],
) -> BTreeMap<PracticeVersionId, BTreeSet<GoalId>> {
    let mut goals: BTreeMap<PracticeVersionId, BTreeSet<GoalId>> = BTreeMap::new();
    for recommendation in recommendations {
        if recommendation.kind != RecommendationKind::Helpful {
            continue;
        }
        goals
            .entry(recommendation.practice_version_id)
            .or_default()
            .extend(recommendation.goal_ids.iter().copied());
    }
    goals
}

pub struct AlternativeMatcher<S> {
    store: Arc<S>,
    aggregator: TeamAggregator<S>,
}

impl<S> Clone for AlternativeMatcher<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            aggregator: self.aggregator.clone(),
        }
    }
}

impl<S> AlternativeMatcher<S>
where
    S: AffinityRepository + CatalogRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        let aggregator = TeamAggregator::new(Arc::clone(&store));
        Self { store, aggregator }
    }

    pub fn find_alternatives(
        &self,
        practice_version_id: PracticeVersionId,
        person_ids: &[PersonId],
        min_improvement: f64,
    ) -> Result<Vec<Alternative>, EngineError> {
        if !min_improvement.is_finite() || min_improvement < 0.0 {
            return Err(ValidationError::InvalidImprovement(min_improvement).into());
        }
        let original = self
            .store
            .practice_version(practice_version_id)?
            .ok_or_else(|| EngineError::not_found("practice version", practice_version_id.0))?;

        let current = self
            .aggregator
            .team_affinity(person_ids, practice_version_id)?;

        let goals = goals_by_practice(&self.store.recommendations()?);
        let Some(original_goals) = goals
            .get(&practice_version_id)
            .filter(|served| !served.is_empty())
        else {
            debug!(%practice_version_id, "practice serves no goals; no alternatives");
            return Ok(Vec::new());
        };
        let required = required_goal_overlap(original_goals.len());

        let mut alternatives = Vec::new();
        for candidate in self.store.practice_versions()? {
            if candidate.id() == practice_version_id {
                continue;
            }
            let shared: BTreeSet<GoalId> = goals
                .get(&candidate.id())
                .map(|candidate_goals| {
                    candidate_goals
                        .intersection(original_goals)
                        .copied()
                        .collect()
                })
                .unwrap_or_default();
            if shared.len() < required {
                continue;
            }

            let stats = self.aggregator.team_affinity(person_ids, candidate.id())?;
            if stats.average <= current.average + min_improvement {
                continue;
            }

            let improvement = round_to_hundredths(stats.average - current.average);
            let reason = format!(
                "{} covers {} of {} goals served by {} and raises team affinity by {:.1} points ({:.1} -> {:.1})",
                candidate.name(),
                shared.len(),
                original_goals.len(),
                original.name(),
                improvement,
                current.average,
                stats.average,
            );
            alternatives.push(Alternative {
                practice_version_id: candidate.id(),
                practice_name: candidate.name().to_string(),
                shared_goals: self.store.goals(&shared)?,
                current_average: current.average,
                stats,
                affinity_improvement: improvement,
                reason,
            });
        }

        alternatives.sort_by(|a, b| {
            b.affinity_improvement
                .total_cmp(&a.affinity_improvement)
                .then(a.practice_version_id.cmp(&b.practice_version_id))
        });
        debug!(
            %practice_version_id,
            candidates = alternatives.len(),
            "alternative search finished"
        );
        Ok(alternatives)
    }
}
