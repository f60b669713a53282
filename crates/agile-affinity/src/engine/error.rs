use super::domain::PersonId;
use super::repository::RepositoryError;

/// Input rejected before any write reaches the datastore.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("survey submission contains no answers")]
    EmptySurvey,
    #[error("survey item {0} is not part of the questionnaire")]
    UnknownSurveyItem(u32),
    #[error("answer {value} for survey item {item_id} must be between 1 and 5")]
    AnswerOutOfRange { item_id: u32, value: u8 },
    #[error("affinity score {0} must be between 0 and 100")]
    ScoreOutOfRange(i64),
    #[error("affinity threshold {0} must be between 0 and 100")]
    ThresholdOutOfRange(u8),
    #[error("minimum improvement {0} must be a non-negative number")]
    InvalidImprovement(f64),
    #[error("request must name a team or list its person ids")]
    MissingTeamSelector,
}

/// Error returned by every engine operation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("affinity batch for person {person_id} rolled back: {source}")]
    Transaction {
        person_id: PersonId,
        #[source]
        source: RepositoryError,
    },
    #[error("background recalculation failed to run: {0}")]
    Background(String),
    #[error("recalculation queue is closed")]
    QueueClosed,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}
