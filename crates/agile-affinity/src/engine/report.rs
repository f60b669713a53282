use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::alternatives::{Alternative, AlternativeMatcher, DEFAULT_MIN_IMPROVEMENT};
use super::domain::{ContextId, GoalId, PersonId, PracticeVersionId, RecommendationId, RecommendationKind};
use super::error::{EngineError, ValidationError};
use super::flags::{DifficultyFlagRegistry, FlaggedPractice};
use super::repository::{AffinityRepository, CatalogRepository, FlagRepository, PeopleRepository};
use super::team::{
    PracticeStanding, RankedPractice, TeamAffinityStats, TeamAggregator,
    DEFAULT_RECOMMENDATION_THRESHOLD,
};

/// Knobs for [`ReportBuilder::comprehensive_report`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    #[serde(default)]
    pub min_affinity_threshold: Option<u8>,
    #[serde(default)]
    pub min_improvement: Option<f64>,
    #[serde(default)]
    pub context_id: Option<ContextId>,
    #[serde(default)]
    pub goal_ids: Vec<GoalId>,
    #[serde(default)]
    pub include_difficult: bool,
    #[serde(default)]
    pub include_alternatives: bool,
}

/// Practice recommended for the requested context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecommendation {
    pub practice_version_id: PracticeVersionId,
    pub practice_name: String,
    pub recommendation_ids: Vec<RecommendationId>,
    pub matched_goals: Vec<GoalId>,
    pub stats: TeamAffinityStats,
}

/// Alternative proposed for a low-affinity practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementSuggestion {
    pub replaces: PracticeVersionId,
    pub replaces_name: String,
    #[serde(flatten)]
    pub alternative: Alternative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub member_count: usize,
    pub high_affinity_count: usize,
    pub low_affinity_count: usize,
    pub context_recommendation_count: usize,
    pub difficult_count: usize,
    pub alternative_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub high_affinity: Vec<RankedPractice>,
    pub low_affinity: Vec<RankedPractice>,
    pub context_recommendations: Vec<ContextRecommendation>,
    pub difficult_practices: Vec<FlaggedPractice>,
    pub alternatives: Vec<ReplacementSuggestion>,
    pub summary: ReportSummary,
}

pub struct ReportBuilder<S> {
    store: Arc<S>,
    aggregator: TeamAggregator<S>,
    matcher: AlternativeMatcher<S>,
    flags: DifficultyFlagRegistry<S>,
}

impl<S> Clone for ReportBuilder<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            aggregator: self.aggregator.clone(),
            matcher: self.matcher.clone(),
            flags: self.flags.clone(),
        }
    }
}

impl<S> ReportBuilder<S>
where
    S: PeopleRepository + CatalogRepository + AffinityRepository + FlagRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            aggregator: TeamAggregator::new(Arc::clone(&store)),
            matcher: AlternativeMatcher::new(Arc::clone(&store)),
            flags: DifficultyFlagRegistry::new(Arc::clone(&store)),
            store,
        }
    }

    /// Builds the full team report. Any failing alternative lookup fails the
    /// whole report.
    pub fn comprehensive_report(
        &self,
        person_ids: &[PersonId],
        options: &ReportOptions,
    ) -> Result<RecommendationReport, EngineError> {
        let threshold = options
            .min_affinity_threshold
            .unwrap_or(DEFAULT_RECOMMENDATION_THRESHOLD);
        if threshold > 100 {
            return Err(ValidationError::ThresholdOutOfRange(threshold).into());
        }
        let min_improvement = options.min_improvement.unwrap_or(DEFAULT_MIN_IMPROVEMENT);

        let (high_affinity, low_affinity): (Vec<_>, Vec<_>) = self
            .aggregator
            .team_recommendations(person_ids, threshold)?
            .into_iter()
            .partition(|ranked| ranked.standing == PracticeStanding::Recommended);

        let context_recommendations = match options.context_id {
            Some(context_id) => self.context_candidates(person_ids, context_id, &options.goal_ids)?,
            None => Vec::new(),
        };

        let difficult_practices = if options.include_difficult {
            self.flags.flagged_for_team(person_ids, min_improvement)?
        } else {
            Vec::new()
        };

        let mut alternatives = Vec::new();
        if options.include_alternatives {
            for ranked in &low_affinity {
                let found = self.matcher.find_alternatives(
                    ranked.practice_version_id,
                    person_ids,
                    min_improvement,
                )?;
                alternatives.extend(found.into_iter().map(|alternative| ReplacementSuggestion {
                    replaces: ranked.practice_version_id,
                    replaces_name: ranked.practice_name.clone(),
                    alternative,
                }));
            }
        }

        let summary = ReportSummary {
            member_count: person_ids.len(),
            high_affinity_count: high_affinity.len(),
            low_affinity_count: low_affinity.len(),
            context_recommendation_count: context_recommendations.len(),
            difficult_count: difficult_practices.len(),
            alternative_count: alternatives.len(),
        };
        info!(
            members = summary.member_count,
            high = summary.high_affinity_count,
            low = summary.low_affinity_count,
            alternatives = summary.alternative_count,
            "team report built"
        );

        Ok(RecommendationReport {
            high_affinity,
            low_affinity,
            context_recommendations,
            difficult_practices,
            alternatives,
            summary,
        })
    }

    /// Helpful recommendations that apply to the context (or to any context),
    /// narrowed to the goal filter when one is given.
    fn context_candidates(
        &self,
        person_ids: &[PersonId],
        context_id: ContextId,
        goal_filter: &[GoalId],
    ) -> Result<Vec<ContextRecommendation>, EngineError> {
        let goal_filter: BTreeSet<GoalId> = goal_filter.iter().copied().collect();
        let mut matches: BTreeMap<PracticeVersionId, (Vec<RecommendationId>, BTreeSet<GoalId>)> =
            BTreeMap::new();

        for recommendation in self.store.recommendations()? {
            if recommendation.kind != RecommendationKind::Helpful {
                continue;
            }
            if recommendation
                .context_id
                .is_some_and(|context| context != context_id)
            {
                continue;
            }
            let matched: BTreeSet<GoalId> = if goal_filter.is_empty() {
                recommendation.goal_ids.clone()
            } else {
                recommendation
                    .goal_ids
                    .intersection(&goal_filter)
                    .copied()
                    .collect()
            };
            if !goal_filter.is_empty() && matched.is_empty() {
                continue;
            }

            let slot = matches
                .entry(recommendation.practice_version_id)
                .or_default();
            slot.0.push(recommendation.id);
            slot.1.extend(matched);
        }

        let mut candidates = Vec::with_capacity(matches.len());
        for (practice_version_id, (recommendation_ids, matched_goals)) in matches {
            let Some(entry) = self.store.practice_version(practice_version_id)? else {
                continue;
            };
            let stats = self.aggregator.team_affinity(person_ids, practice_version_id)?;
            candidates.push(ContextRecommendation {
                practice_version_id,
                practice_name: entry.name().to_string(),
                recommendation_ids,
                matched_goals: matched_goals.into_iter().collect(),
                stats,
            });
        }

        candidates.sort_by(|a, b| {
            b.stats
                .average
                .total_cmp(&a.stats.average)
                .then(a.practice_version_id.cmp(&b.practice_version_id))
        });
        Ok(candidates)
    }
}
