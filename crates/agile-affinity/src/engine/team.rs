use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{PersonId, PracticeVersionId};
use super::error::EngineError;
use super::repository::{AffinityRepository, CatalogRepository};

/// Members scoring strictly below this are reported as low-affinity.
pub const LOW_AFFINITY_THRESHOLD: u8 = 40;
/// Default team average at which a practice is recommended.
pub const DEFAULT_RECOMMENDATION_THRESHOLD: u8 = 60;
/// A practice whose weakest member scores below this is problematic.
pub const PROBLEMATIC_MINIMUM: u8 = 30;

/// One member's stored affinity; unscored members count as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAffinity {
    pub person_id: PersonId,
    pub score: u8,
    pub scored: bool,
}

/// Aggregate statistics of a team's affinities for one practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAffinityStats {
    pub average: f64,
    pub minimum: u8,
    pub maximum: u8,
    pub standard_deviation: f64,
    pub member_count: usize,
    pub individual_scores: Vec<MemberAffinity>,
}

impl TeamAffinityStats {
    pub fn from_members(individual_scores: Vec<MemberAffinity>) -> Self {
        let member_count = individual_scores.len();
        if member_count == 0 {
            return Self {
                average: 0.0,
                minimum: 0,
                maximum: 0,
                standard_deviation: 0.0,
                member_count,
                individual_scores,
            };
        }

        let count = member_count as f64;
        let mean = individual_scores
            .iter()
            .map(|member| f64::from(member.score))
            .sum::<f64>()
            / count;
        let variance = individual_scores
            .iter()
            .map(|member| (f64::from(member.score) - mean).powi(2))
            .sum::<f64>()
            / count;
        let minimum = individual_scores
            .iter()
            .map(|member| member.score)
            .min()
            .unwrap_or(0);
        let maximum = individual_scores
            .iter()
            .map(|member| member.score)
            .max()
            .unwrap_or(0);

        Self {
            average: round_to_hundredths(mean),
            minimum,
            maximum,
            standard_deviation: round_to_hundredths(variance.sqrt()),
            member_count,
            individual_scores,
        }
    }
}

pub(crate) fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeStanding {
    Recommended,
    Problematic,
}

/// Practice classified against a team's affinity statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPractice {
    pub practice_version_id: PracticeVersionId,
    pub practice_name: String,
    pub standing: PracticeStanding,
    pub stats: TeamAffinityStats,
}

/// Computes team-level affinity statistics from stored rows.
pub struct TeamAggregator<S> {
    store: Arc<S>,
}

impl<S> Clone for TeamAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> TeamAggregator<S>
where
    S: AffinityRepository + CatalogRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn team_affinity(
        &self,
        person_ids: &[PersonId],
        practice_version_id: PracticeVersionId,
    ) -> Result<TeamAffinityStats, EngineError> {
        let mut members = Vec::with_capacity(person_ids.len());
        for person_id in person_ids {
            let record = self.store.affinity(*person_id, practice_version_id)?;
            members.push(MemberAffinity {
                person_id: *person_id,
                score: record.as_ref().map(|record| record.score).unwrap_or(0),
                scored: record.is_some(),
            });
        }
        Ok(TeamAffinityStats::from_members(members))
    }

    pub fn low_affinity_members(
        &self,
        person_ids: &[PersonId],
        practice_version_id: PracticeVersionId,
        threshold: u8,
    ) -> Result<Vec<MemberAffinity>, EngineError> {
        let stats = self.team_affinity(person_ids, practice_version_id)?;
        Ok(stats
            .individual_scores
            .into_iter()
            .filter(|member| member.score < threshold)
            .collect())
    }

    /// Recommended practices reach `min_threshold` on average; the rest are
    /// reported as problematic only when some member scores below
    /// [`PROBLEMATIC_MINIMUM`]. Practices meeting neither are omitted.
    pub fn team_recommendations(
        &self,
        person_ids: &[PersonId],
        min_threshold: u8,
    ) -> Result<Vec<RankedPractice>, EngineError> {
        let mut ranked = Vec::new();
        for entry in self.store.practice_versions()? {
            let stats = self.team_affinity(person_ids, entry.id())?;
            let standing = if stats.average >= f64::from(min_threshold) {
                PracticeStanding::Recommended
            } else if stats.minimum < PROBLEMATIC_MINIMUM {
                PracticeStanding::Problematic
            } else {
                continue;
            };
            ranked.push(RankedPractice {
                practice_version_id: entry.id(),
                practice_name: entry.name().to_string(),
                standing,
                stats,
            });
        }

        ranked.sort_by(|a, b| {
            b.stats
                .average
                .total_cmp(&a.stats.average)
                .then(a.practice_version_id.cmp(&b.practice_version_id))
        });
        Ok(ranked)
    }
}
