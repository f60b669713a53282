use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::domain::{
    ContextId, PersonId, PracticeVersionId, ProfileStatus, TeamId, TraitProfile, TraitScores,
};
use super::error::EngineError;
use super::report::ReportOptions;
use super::repository::EngineStore;
use super::service::{AffinityService, TeamSelector};
use super::survey::{survey_items, SurveyAnswer};

type SharedService<S> = Arc<AffinityService<S>>;

/// Router exposing the engine under `/api/v1`.
pub fn engine_router<S>(service: SharedService<S>) -> Router
where
    S: EngineStore + 'static,
{
    Router::new()
        .route("/api/v1/survey/items", get(survey_items_handler))
        .route(
            "/api/v1/persons/:person_id/survey",
            post(submit_survey_handler::<S>),
        )
        .route(
            "/api/v1/persons/:person_id/affinities",
            get(person_affinities_handler::<S>),
        )
        .route(
            "/api/v1/persons/:person_id/affinities/recalculate",
            post(recalculate_handler::<S>),
        )
        .route(
            "/api/v1/persons/:person_id/affinities/:practice_version_id",
            put(manual_affinity_handler::<S>),
        )
        .route(
            "/api/v1/persons/:person_id/flags/:practice_version_id",
            post(flag_handler::<S>),
        )
        .route("/api/v1/teams/affinity", post(team_affinity_handler::<S>))
        .route(
            "/api/v1/teams/recommendations",
            post(team_recommendations_handler::<S>),
        )
        .route(
            "/api/v1/teams/alternatives",
            post(alternatives_handler::<S>),
        )
        .route("/api/v1/teams/flags", post(team_flags_handler::<S>))
        .route("/api/v1/teams/report", post(report_handler::<S>))
        .route(
            "/api/v1/teams/:team_id/report",
            get(team_report_handler::<S>),
        )
        .with_state(service)
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::Transaction { .. }
            | EngineError::Background(_)
            | EngineError::QueueClosed
            | EngineError::Repository(_) => {
                warn!(error = %self, "engine request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SurveyRequest {
    pub(crate) answers: Vec<SurveyAnswer>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SurveyResponse {
    pub(crate) profile: TraitProfile,
    pub(crate) scores: TraitScores,
    pub(crate) status: ProfileStatus,
    pub(crate) recalculation_queued: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ManualAffinityRequest {
    pub(crate) score: i64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FlagRequest {
    #[serde(default)]
    pub(crate) reason: Option<String>,
    #[serde(default)]
    pub(crate) context_id: Option<ContextId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamAffinityRequest {
    #[serde(flatten)]
    pub(crate) team: TeamSelector,
    pub(crate) practice_version_id: PracticeVersionId,
    #[serde(default)]
    pub(crate) low_affinity_threshold: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamRecommendationsRequest {
    #[serde(flatten)]
    pub(crate) team: TeamSelector,
    #[serde(default)]
    pub(crate) min_threshold: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlternativesRequest {
    #[serde(flatten)]
    pub(crate) team: TeamSelector,
    pub(crate) practice_version_id: PracticeVersionId,
    #[serde(default)]
    pub(crate) min_improvement: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportRequest {
    #[serde(flatten)]
    pub(crate) team: TeamSelector,
    #[serde(flatten)]
    pub(crate) options: ReportOptions,
}

pub(crate) async fn survey_items_handler() -> Response {
    (StatusCode::OK, Json(json!({ "items": survey_items() }))).into_response()
}

pub(crate) async fn submit_survey_handler<S>(
    State(service): State<SharedService<S>>,
    Path(person_id): Path<i64>,
    Json(request): Json<SurveyRequest>,
) -> Response
where
    S: EngineStore + 'static,
{
    match service.submit_survey(PersonId(person_id), &request.answers) {
        Ok(submission) => {
            let body = SurveyResponse {
                status: submission.profile.status,
                recalculation_queued: submission.recalculation.is_some(),
                profile: submission.profile,
                scores: submission.scores,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn person_affinities_handler<S>(
    State(service): State<SharedService<S>>,
    Path(person_id): Path<i64>,
) -> Response
where
    S: EngineStore + 'static,
{
    match service.affinities_for_person(PersonId(person_id)) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn recalculate_handler<S>(
    State(service): State<SharedService<S>>,
    Path(person_id): Path<i64>,
) -> Response
where
    S: EngineStore + 'static,
{
    match service.recalculate_affinities(PersonId(person_id)) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn manual_affinity_handler<S>(
    State(service): State<SharedService<S>>,
    Path((person_id, practice_version_id)): Path<(i64, i64)>,
    Json(request): Json<ManualAffinityRequest>,
) -> Response
where
    S: EngineStore + 'static,
{
    match service.set_manual_affinity(
        PersonId(person_id),
        PracticeVersionId(practice_version_id),
        request.score,
    ) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn flag_handler<S>(
    State(service): State<SharedService<S>>,
    Path((person_id, practice_version_id)): Path<(i64, i64)>,
    Json(request): Json<FlagRequest>,
) -> Response
where
    S: EngineStore + 'static,
{
    match service.flag_difficulty(
        PersonId(person_id),
        PracticeVersionId(practice_version_id),
        request.reason,
        request.context_id,
    ) {
        Ok(flag) => (StatusCode::CREATED, Json(flag)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn team_affinity_handler<S>(
    State(service): State<SharedService<S>>,
    Json(request): Json<TeamAffinityRequest>,
) -> Response
where
    S: EngineStore + 'static,
{
    let result = service.resolve_team(&request.team).and_then(|members| {
        let stats = service.team_affinity(&members, request.practice_version_id)?;
        let low_affinity = service.low_affinity_members(
            &members,
            request.practice_version_id,
            request.low_affinity_threshold,
        )?;
        Ok(json!({ "stats": stats, "low_affinity_members": low_affinity }))
    });
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn team_recommendations_handler<S>(
    State(service): State<SharedService<S>>,
    Json(request): Json<TeamRecommendationsRequest>,
) -> Response
where
    S: EngineStore + 'static,
{
    let result = service
        .resolve_team(&request.team)
        .and_then(|members| service.team_recommendations(&members, request.min_threshold));
    match result {
        Ok(ranked) => (StatusCode::OK, Json(ranked)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn alternatives_handler<S>(
    State(service): State<SharedService<S>>,
    Json(request): Json<AlternativesRequest>,
) -> Response
where
    S: EngineStore + 'static,
{
    let result = service.resolve_team(&request.team).and_then(|members| {
        service.find_alternatives(
            request.practice_version_id,
            &members,
            request.min_improvement,
        )
    });
    match result {
        Ok(alternatives) => (StatusCode::OK, Json(alternatives)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn team_flags_handler<S>(
    State(service): State<SharedService<S>>,
    Json(team): Json<TeamSelector>,
) -> Response
where
    S: EngineStore + 'static,
{
    let result = service
        .resolve_team(&team)
        .and_then(|members| service.flagged_for_team(&members));
    match result {
        Ok(flagged) => (StatusCode::OK, Json(flagged)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn report_handler<S>(
    State(service): State<SharedService<S>>,
    Json(request): Json<ReportRequest>,
) -> Response
where
    S: EngineStore + 'static,
{
    let ReportRequest { team, options } = request;
    let result = service
        .resolve_team(&team)
        .and_then(|members| service.comprehensive_report(&members, options));
    match result {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Full report for a stored team with alternatives and difficulty flags.
pub(crate) async fn team_report_handler<S>(
    State(service): State<SharedService<S>>,
    Path(team_id): Path<i64>,
) -> Response
where
    S: EngineStore + 'static,
{
    let selector = TeamSelector {
        team_id: Some(TeamId(team_id)),
        person_ids: Vec::new(),
    };
    let options = ReportOptions {
        include_difficult: true,
        include_alternatives: true,
        ..ReportOptions::default()
    };
    let result = service
        .resolve_team(&selector)
        .and_then(|members| service.comprehensive_report(&members, options));
    match result {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => err.into_response(),
    }
}
