//! Scores how well a trait profile fits a practice.
//!
//! Scores start at 50 and move with the practice's characteristics: structure
//! rewards conscientiousness, collaboration rewards extraversion and
//! agreeableness, creativity rewards openness, and practices that assume a
//! stable environment penalise neuroticism. Results are clamped to 0..=100.

use serde::{Deserialize, Serialize};

use super::domain::{BigFive, Practice, PracticeTypeId, TraitDimension, TraitProfile};

/// Practice category whose members demand planning and discipline.
pub const STRUCTURED_CATEGORY: PracticeTypeId = PracticeTypeId(1);
/// Practice category whose members are performed together with others.
pub const COLLABORATIVE_CATEGORY: PracticeTypeId = PracticeTypeId(2);

const BASE_SCORE: f64 = 50.0;
const STRUCTURE_WEIGHT: f64 = 30.0;
const COLLABORATION_EXTRAVERSION_WEIGHT: f64 = 25.0;
const COLLABORATION_AGREEABLENESS_WEIGHT: f64 = 20.0;
const CREATIVITY_WEIGHT: f64 = 35.0;
const STABILITY_PENALTY: f64 = 25.0;

/// Demands a practice places on the people applying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeCharacteristics {
    pub requires_structure: bool,
    pub requires_collaboration: bool,
    pub requires_creativity: bool,
    pub requires_stability: bool,
}

impl PracticeCharacteristics {
    pub fn derive(type_id: PracticeTypeId, description: &str) -> Self {
        let description = description.to_lowercase();
        Self {
            requires_structure: type_id == STRUCTURED_CATEGORY,
            requires_collaboration: type_id == COLLABORATIVE_CATEGORY,
            requires_creativity: description.contains("innovation")
                || description.contains("creative"),
            requires_stability: !description.contains("change"),
        }
    }

    pub fn of(practice: &Practice) -> Self {
        Self::derive(practice.type_id, &practice.description)
    }
}

/// Single weighted trait term of an affinity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityComponent {
    pub dimension: TraitDimension,
    pub contribution: f64,
    pub notes: String,
}

/// Score together with the terms that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityBreakdown {
    pub characteristics: PracticeCharacteristics,
    pub components: Vec<AffinityComponent>,
    pub score: u8,
}

pub fn explain(traits: &BigFive, practice: &Practice) -> AffinityBreakdown {
    let characteristics = PracticeCharacteristics::of(practice);
    let mut components = Vec::new();

    if characteristics.requires_structure {
        components.push(AffinityComponent {
            dimension: TraitDimension::Conscientiousness,
            contribution: traits.conscientiousness * STRUCTURE_WEIGHT,
            notes: "structured practice rewards conscientiousness".to_string(),
        });
    }

    if characteristics.requires_collaboration {
        components.push(AffinityComponent {
            dimension: TraitDimension::Extraversion,
            contribution: traits.extraversion * COLLABORATION_EXTRAVERSION_WEIGHT,
            notes: "collaborative practice rewards extraversion".to_string(),
        });
        components.push(AffinityComponent {
            dimension: TraitDimension::Agreeableness,
            contribution: traits.agreeableness * COLLABORATION_AGREEABLENESS_WEIGHT,
            notes: "collaborative practice rewards agreeableness".to_string(),
        });
    }

    if characteristics.requires_creativity {
        components.push(AffinityComponent {
            dimension: TraitDimension::Openness,
            contribution: traits.openness * CREATIVITY_WEIGHT,
            notes: "creative practice rewards openness".to_string(),
        });
    }

    if characteristics.requires_stability {
        components.push(AffinityComponent {
            dimension: TraitDimension::Neuroticism,
            contribution: -(traits.neuroticism * STABILITY_PENALTY),
            notes: "stable practice penalises neuroticism".to_string(),
        });
    }

    let raw = BASE_SCORE
        + components
            .iter()
            .map(|component| component.contribution)
            .sum::<f64>();

    AffinityBreakdown {
        characteristics,
        components,
        score: raw.round().clamp(0.0, 100.0) as u8,
    }
}

/// Affinity of a complete personality vector for a practice.
pub fn score(traits: &BigFive, practice: &Practice) -> u8 {
    explain(traits, practice).score
}

/// Affinity of a stored profile; an incomplete profile scores 0.
pub fn score_profile(profile: &TraitProfile, practice: &Practice) -> u8 {
    profile
        .big_five()
        .map(|traits| score(&traits, practice))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::domain::{PersonId, PracticeId, TraitScores};
    use chrono::Utc;

    fn practice(type_id: i64, description: &str) -> Practice {
        Practice {
            id: PracticeId(1),
            name: "Practice".to_string(),
            description: description.to_string(),
            type_id: PracticeTypeId(type_id),
        }
    }

    fn profile() -> BigFive {
        BigFive {
            openness: 0.8,
            conscientiousness: 0.3,
            extraversion: 0.2,
            agreeableness: 0.5,
            neuroticism: 0.9,
        }
    }

    #[test]
    fn characteristics_follow_category_and_description() {
        let structured = PracticeCharacteristics::derive(STRUCTURED_CATEGORY, "Daily planning");
        assert!(structured.requires_structure);
        assert!(!structured.requires_collaboration);
        assert!(structured.requires_stability);

        let collaborative =
            PracticeCharacteristics::derive(COLLABORATIVE_CATEGORY, "Embrace CHANGE together");
        assert!(collaborative.requires_collaboration);
        assert!(!collaborative.requires_stability);

        let creative = PracticeCharacteristics::derive(PracticeTypeId(9), "Fosters Innovation");
        assert!(creative.requires_creativity);
        assert!(!creative.requires_structure);
    }

    #[test]
    fn innovative_wording_alone_does_not_mark_creativity() {
        // "innovative" contains neither "innovation" nor "creative".
        let practice = practice(9, "An innovative approach to planning");
        let breakdown = explain(&profile(), &practice);

        assert!(!breakdown.characteristics.requires_creativity);
        assert!(breakdown.characteristics.requires_stability);
        // round(50 - 0.9 * 25) = round(27.5)
        assert_eq!(breakdown.score, 28);
    }

    #[test]
    fn creative_practice_rewards_openness() {
        let practice = practice(9, "A creative approach to planning");
        // round(50 + 0.8 * 35 - 0.9 * 25) = round(55.5)
        assert_eq!(score(&profile(), &practice), 56);
    }

    #[test]
    fn all_characteristics_combine_and_clamp() {
        let traits = BigFive {
            openness: 1.0,
            conscientiousness: 1.0,
            extraversion: 1.0,
            agreeableness: 1.0,
            neuroticism: 0.0,
        };
        let structured = practice(1, "creative innovation workshop");
        assert_eq!(score(&traits, &structured), 100);

        let collaborative = practice(2, "creative pairing without change");
        // 50 + 25 + 20 + 35 = 130 before clamping
        assert_eq!(score(&traits, &collaborative), 100);

        let anxious = BigFive {
            neuroticism: 1.0,
            openness: 0.0,
            ..traits
        };
        assert_eq!(score(&anxious, &practice(9, "steady cadence")), 25);
    }

    #[test]
    fn scoring_is_deterministic_and_bounded() {
        let samples = [0.0, 0.25, 0.5, 0.75, 1.0];
        let practices = [
            practice(1, "structured review"),
            practice(2, "creative change"),
            practice(3, "innovation sprint"),
        ];
        for value in samples {
            let traits = BigFive {
                openness: value,
                conscientiousness: 1.0 - value,
                extraversion: value,
                agreeableness: 1.0 - value,
                neuroticism: value,
            };
            for practice in &practices {
                let first = score(&traits, practice);
                assert!(first <= 100);
                assert_eq!(first, score(&traits, practice));
            }
        }
    }

    #[test]
    fn incomplete_profile_scores_zero() {
        let profile = TraitProfile::new(
            PersonId(7),
            TraitScores {
                openness: Some(1.0),
                ..TraitScores::default()
            },
            Utc::now(),
        );
        assert_eq!(score_profile(&profile, &practice(1, "structured")), 0);
    }
}
