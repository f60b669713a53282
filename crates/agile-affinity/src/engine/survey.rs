//! Converts Likert survey answers into trait scores.
//!
//! Each questionnaire item feeds exactly one Big Five dimension. Answers are
//! normalised by dividing by five, reverse-scored items contribute
//! `1 - normalised`, and every dimension is the mean of its contributions.
//! Dimensions without answers stay unset so that a later submission can fill
//! them in without disturbing the others.

use serde::{Deserialize, Serialize};

use super::domain::{TraitDimension, TraitScores};
use super::error::ValidationError;

pub const LIKERT_MIN: u8 = 1;
pub const LIKERT_MAX: u8 = 5;

/// A questionnaire item and the dimension it measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SurveyItem {
    pub id: u32,
    pub dimension: TraitDimension,
    pub reverse_scored: bool,
    pub prompt: &'static str,
}

const SURVEY_ITEMS: [SurveyItem; 10] = [
    SurveyItem {
        id: 1,
        dimension: TraitDimension::Openness,
        reverse_scored: false,
        prompt: "I enjoy experimenting with new ways of working",
    },
    SurveyItem {
        id: 2,
        dimension: TraitDimension::Openness,
        reverse_scored: false,
        prompt: "I am curious about unfamiliar ideas and tools",
    },
    SurveyItem {
        id: 3,
        dimension: TraitDimension::Conscientiousness,
        reverse_scored: false,
        prompt: "I plan my work carefully before starting",
    },
    SurveyItem {
        id: 4,
        dimension: TraitDimension::Conscientiousness,
        reverse_scored: false,
        prompt: "I follow through on the commitments I make",
    },
    SurveyItem {
        id: 5,
        dimension: TraitDimension::Extraversion,
        reverse_scored: false,
        prompt: "Group discussions give me energy",
    },
    SurveyItem {
        id: 6,
        dimension: TraitDimension::Extraversion,
        reverse_scored: false,
        prompt: "I speak up readily in meetings",
    },
    SurveyItem {
        id: 7,
        dimension: TraitDimension::Agreeableness,
        reverse_scored: false,
        prompt: "I look for compromise when opinions differ",
    },
    SurveyItem {
        id: 8,
        dimension: TraitDimension::Agreeableness,
        reverse_scored: false,
        prompt: "I enjoy helping teammates with their work",
    },
    SurveyItem {
        id: 9,
        dimension: TraitDimension::Neuroticism,
        reverse_scored: false,
        prompt: "I worry when plans are uncertain",
    },
    SurveyItem {
        id: 10,
        dimension: TraitDimension::Neuroticism,
        reverse_scored: true,
        prompt: "I am comfortable with sudden changes",
    },
];

pub fn survey_items() -> &'static [SurveyItem] {
    &SURVEY_ITEMS
}

pub fn lookup_item(item_id: u32) -> Option<&'static SurveyItem> {
    SURVEY_ITEMS.iter().find(|item| item.id == item_id)
}

/// One raw answer on the 1 to 5 Likert scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyAnswer {
    pub item_id: u32,
    pub value: u8,
}

/// Scores a batch of answers. Every answer is validated before any dimension
/// is computed, so a single bad answer rejects the whole submission.
pub fn score_answers(answers: &[SurveyAnswer]) -> Result<TraitScores, ValidationError> {
    if answers.is_empty() {
        return Err(ValidationError::EmptySurvey);
    }

    let mut contributions = Vec::with_capacity(answers.len());
    for answer in answers {
        let item = lookup_item(answer.item_id)
            .ok_or(ValidationError::UnknownSurveyItem(answer.item_id))?;
        if !(LIKERT_MIN..=LIKERT_MAX).contains(&answer.value) {
            return Err(ValidationError::AnswerOutOfRange {
                item_id: answer.item_id,
                value: answer.value,
            });
        }

        let normalized = f64::from(answer.value) / f64::from(LIKERT_MAX);
        let value = if item.reverse_scored {
            1.0 - normalized
        } else {
            normalized
        };
        contributions.push((item.dimension, value));
    }

    let mut totals = [(0.0_f64, 0_u32); 5];
    for (dimension, value) in contributions {
        let slot = &mut totals[dimension.index()];
        slot.0 += value;
        slot.1 += 1;
    }

    let mut scores = TraitScores::default();
    for dimension in TraitDimension::ordered() {
        let (sum, count) = totals[dimension.index()];
        if count > 0 {
            scores.set(dimension, sum / f64::from(count));
        }
    }

    Ok(scores)
}
