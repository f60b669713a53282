use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

identifier!(
    /// Identifier of a surveyed team member.
    PersonId
);
identifier!(
    /// Identifier of a team grouping several persons.
    TeamId
);
identifier!(PracticeId);
identifier!(
    /// Identifier of a concrete, versioned practice; affinities are keyed on it.
    PracticeVersionId
);
identifier!(
    /// Category of a practice, used to derive its characteristics.
    PracticeTypeId
);
identifier!(GoalId);
identifier!(RecommendationId);
identifier!(
    /// Usage context (e.g. a project phase) a recommendation applies to.
    ContextId
);

/// Catalog entry for an agile practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Practice {
    pub id: PracticeId,
    pub name: String,
    pub description: String,
    pub type_id: PracticeTypeId,
}

/// A published revision of a practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeVersion {
    pub id: PracticeVersionId,
    pub practice_id: PracticeId,
    pub label: String,
}

/// Practice version joined with the practice it revises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeEntry {
    pub version: PracticeVersion,
    pub practice: Practice,
}

impl PracticeEntry {
    pub fn id(&self) -> PracticeVersionId {
        self.version.id
    }

    pub fn name(&self) -> &str {
        &self.practice.name
    }
}

/// An objective a recommendation claims to serve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Helpful,
    Unhelpful,
}

/// Recommendation of a practice version together with the goals it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: RecommendationId,
    pub practice_version_id: PracticeVersionId,
    pub kind: RecommendationKind,
    pub context_id: Option<ContextId>,
    pub goal_ids: BTreeSet<GoalId>,
}

/// The five Big Five personality dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitDimension {
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
}

impl TraitDimension {
    pub fn ordered() -> [TraitDimension; 5] {
        [
            TraitDimension::Openness,
            TraitDimension::Conscientiousness,
            TraitDimension::Extraversion,
            TraitDimension::Agreeableness,
            TraitDimension::Neuroticism,
        ]
    }

    pub(crate) fn index(self) -> usize {
        match self {
            TraitDimension::Openness => 0,
            TraitDimension::Conscientiousness => 1,
            TraitDimension::Extraversion => 2,
            TraitDimension::Agreeableness => 3,
            TraitDimension::Neuroticism => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TraitDimension::Openness => "Openness",
            TraitDimension::Conscientiousness => "Conscientiousness",
            TraitDimension::Extraversion => "Extraversion",
            TraitDimension::Agreeableness => "Agreeableness",
            TraitDimension::Neuroticism => "Neuroticism",
        }
    }
}

/// Possibly partial trait scores, each in `[0, 1]` once set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TraitScores {
    pub openness: Option<f64>,
    pub conscientiousness: Option<f64>,
    pub extraversion: Option<f64>,
    pub agreeableness: Option<f64>,
    pub neuroticism: Option<f64>,
}

impl TraitScores {
    pub fn get(&self, dimension: TraitDimension) -> Option<f64> {
        match dimension {
            TraitDimension::Openness => self.openness,
            TraitDimension::Conscientiousness => self.conscientiousness,
            TraitDimension::Extraversion => self.extraversion,
            TraitDimension::Agreeableness => self.agreeableness,
            TraitDimension::Neuroticism => self.neuroticism,
        }
    }

    pub fn set(&mut self, dimension: TraitDimension, value: f64) {
        let slot = match dimension {
            TraitDimension::Openness => &mut self.openness,
            TraitDimension::Conscientiousness => &mut self.conscientiousness,
            TraitDimension::Extraversion => &mut self.extraversion,
            TraitDimension::Agreeableness => &mut self.agreeableness,
            TraitDimension::Neuroticism => &mut self.neuroticism,
        };
        *slot = Some(value.clamp(0.0, 1.0));
    }

    /// Overwrites only the dimensions present in `update`.
    pub fn merge(&mut self, update: &TraitScores) {
        for dimension in TraitDimension::ordered() {
            if let Some(value) = update.get(dimension) {
                self.set(dimension, value);
            }
        }
    }

    pub fn missing(&self) -> Vec<TraitDimension> {
        TraitDimension::ordered()
            .into_iter()
            .filter(|dimension| self.get(*dimension).is_none())
            .collect()
    }

    pub fn completeness(&self) -> ProfileCompleteness {
        match (
            self.openness,
            self.conscientiousness,
            self.extraversion,
            self.agreeableness,
            self.neuroticism,
        ) {
            (Some(o), Some(c), Some(e), Some(a), Some(n)) => {
                ProfileCompleteness::Complete(BigFive {
                    openness: o,
                    conscientiousness: c,
                    extraversion: e,
                    agreeableness: a,
                    neuroticism: n,
                })
            }
            _ => ProfileCompleteness::Partial {
                missing: self.missing(),
            },
        }
    }
}

/// Fully populated personality vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BigFive {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileCompleteness {
    Complete(BigFive),
    Partial { missing: Vec<TraitDimension> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    Pending,
    Complete,
}

/// Personality profile owned by a single person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitProfile {
    pub person_id: PersonId,
    pub scores: TraitScores,
    pub status: ProfileStatus,
    pub updated_at: DateTime<Utc>,
}

impl TraitProfile {
    pub fn new(person_id: PersonId, scores: TraitScores, now: DateTime<Utc>) -> Self {
        let mut profile = Self {
            person_id,
            scores: TraitScores::default(),
            status: ProfileStatus::Pending,
            updated_at: now,
        };
        profile.apply(&scores, now);
        profile
    }

    /// Merges a survey result into the profile and refreshes the derived status.
    pub fn apply(&mut self, update: &TraitScores, now: DateTime<Utc>) {
        self.scores.merge(update);
        self.status = if self.is_complete() {
            ProfileStatus::Complete
        } else {
            ProfileStatus::Pending
        };
        self.updated_at = now;
    }

    pub fn is_complete(&self) -> bool {
        self.scores.missing().is_empty()
    }

    pub fn completeness(&self) -> ProfileCompleteness {
        self.scores.completeness()
    }

    pub fn big_five(&self) -> Option<BigFive> {
        match self.completeness() {
            ProfileCompleteness::Complete(traits) => Some(traits),
            ProfileCompleteness::Partial { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffinitySource {
    Calculated,
    Manual,
}

/// Stored affinity of one person for one practice version, 0 to 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffinityRecord {
    pub person_id: PersonId,
    pub practice_version_id: PracticeVersionId,
    pub score: u8,
    pub source: AffinitySource,
    pub updated_at: DateTime<Utc>,
}

/// A person's report that a practice was hard to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyFlag {
    pub person_id: PersonId,
    pub practice_version_id: PracticeVersionId,
    pub reason: Option<String>,
    pub context_id: Option<ContextId>,
    pub flagged_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_touches_supplied_dimensions() {
        let mut scores = TraitScores {
            openness: Some(0.4),
            neuroticism: Some(0.2),
            ..TraitScores::default()
        };
        scores.merge(&TraitScores {
            openness: Some(0.9),
            agreeableness: Some(0.6),
            ..TraitScores::default()
        });

        assert_eq!(scores.openness, Some(0.9));
        assert_eq!(scores.agreeableness, Some(0.6));
        assert_eq!(scores.neuroticism, Some(0.2));
        assert_eq!(scores.conscientiousness, None);
    }

    #[test]
    fn profile_status_tracks_completeness() {
        let now = Utc::now();
        let mut profile = TraitProfile::new(
            PersonId(1),
            TraitScores {
                openness: Some(0.5),
                ..TraitScores::default()
            },
            now,
        );
        assert_eq!(profile.status, ProfileStatus::Pending);
        assert!(profile.big_five().is_none());
        match profile.completeness() {
            ProfileCompleteness::Partial { missing } => assert_eq!(missing.len(), 4),
            other => panic!("expected partial profile, got {other:?}"),
        }

        profile.apply(
            &TraitScores {
                openness: None,
                conscientiousness: Some(0.1),
                extraversion: Some(0.2),
                agreeableness: Some(0.3),
                neuroticism: Some(0.4),
            },
            now,
        );
        assert_eq!(profile.status, ProfileStatus::Complete);
        assert!(profile.is_complete());
        assert_eq!(profile.big_five().map(|traits| traits.openness), Some(0.5));
    }
}
