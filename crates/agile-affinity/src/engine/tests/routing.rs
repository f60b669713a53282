use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Method, Request, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::config::EngineConfig;
use crate::engine::memory::InMemoryStore;
use crate::engine::router::{self, engine_router, ManualAffinityRequest};
use crate::engine::service::AffinityService;

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

fn router_for(store: Arc<InMemoryStore>) -> axum::Router {
    engine_router(Arc::new(service(store)))
}

#[tokio::test]
async fn survey_items_route_lists_questionnaire() {
    let response = router_for(scored_store())
        .oneshot(get("/api/v1/survey/items"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let items = payload["items"].as_array().expect("items array");
    assert_eq!(items.len(), 10);
    assert_eq!(items[9]["reverse_scored"], json!(true));
}

#[tokio::test]
async fn survey_route_reports_queued_recalculation() {
    let answers: Vec<Value> = (1..=10)
        .map(|item_id| json!({ "item_id": item_id, "value": 4 }))
        .collect();

    let response = router_for(Arc::new(catalog().build()))
        .oneshot(json_request(
            Method::POST,
            "/api/v1/persons/1/survey",
            json!({ "answers": answers }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("complete"));
    assert_eq!(payload["recalculation_queued"], json!(true));
    assert_eq!(payload["profile"]["person_id"], json!(1));
}

#[tokio::test]
async fn survey_route_rejects_unknown_items() {
    let response = router_for(Arc::new(catalog().build()))
        .oneshot(json_request(
            Method::POST,
            "/api/v1/persons/1/survey",
            json!({ "answers": [{ "item_id": 42, "value": 3 }] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("42"));
}

#[tokio::test]
async fn manual_affinity_handler_maps_errors_to_status_codes() {
    let service = Arc::new(service(scored_store()));

    let out_of_range = router::manual_affinity_handler::<InMemoryStore>(
        State(service.clone()),
        Path((1, 1)),
        Json(ManualAffinityRequest { score: 150 }),
    )
    .await;
    assert_eq!(out_of_range.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let missing = router::manual_affinity_handler::<InMemoryStore>(
        State(service.clone()),
        Path((404, 1)),
        Json(ManualAffinityRequest { score: 50 }),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let stored = router::manual_affinity_handler::<InMemoryStore>(
        State(service),
        Path((1, 1)),
        Json(ManualAffinityRequest { score: 75 }),
    )
    .await;
    assert_eq!(stored.status(), StatusCode::OK);
    let payload = read_json_body(stored).await;
    assert_eq!(payload["score"], json!(75));
    assert_eq!(payload["source"], json!("manual"));
}

#[tokio::test]
async fn team_affinity_route_accepts_team_id() {
    let response = router_for(scored_store())
        .oneshot(json_request(
            Method::POST,
            "/api/v1/teams/affinity",
            json!({ "team_id": 100, "practice_version_id": 1 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["stats"]["average"], json!(30.0));
    assert_eq!(payload["stats"]["minimum"], json!(20));
    let low = payload["low_affinity_members"]
        .as_array()
        .expect("low members array");
    assert_eq!(low.len(), 2);
}

#[tokio::test]
async fn team_routes_require_a_selector() {
    let response = router_for(scored_store())
        .oneshot(json_request(
            Method::POST,
            "/api/v1/teams/recommendations",
            json!({ "min_threshold": 60 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn alternatives_route_accepts_person_list() {
    let response = router_for(scored_store())
        .oneshot(json_request(
            Method::POST,
            "/api/v1/teams/alternatives",
            json!({ "person_ids": [1, 2, 3], "practice_version_id": 1, "min_improvement": 10 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let found: Vec<i64> = payload
        .as_array()
        .expect("alternatives array")
        .iter()
        .filter_map(|alternative| alternative["practice_version_id"].as_i64())
        .collect();
    assert_eq!(found, vec![2, 6]);
}

#[tokio::test]
async fn flag_route_returns_created() {
    let response = router_for(scored_store())
        .oneshot(json_request(
            Method::POST,
            "/api/v1/persons/2/flags/1",
            json!({ "reason": "standing for an hour" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["reason"], json!("standing for an hour"));
}

#[tokio::test]
async fn stored_team_report_includes_alternatives() {
    let router = router_for(scored_store());

    let response = router
        .clone()
        .oneshot(get("/api/v1/teams/100/report"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["summary"]["member_count"], json!(3));
    assert_eq!(payload["summary"]["low_affinity_count"], json!(1));
    assert_eq!(payload["summary"]["alternative_count"], json!(2));

    let missing = router
        .oneshot(get("/api/v1/teams/5/report"))
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repository_failures_surface_as_internal_errors() {
    let store = Arc::new(FaultyStore::failing_recommendations(scored_catalog().build()));
    let router = engine_router(Arc::new(AffinityService::new(
        store,
        EngineConfig::default(),
    )));

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/teams/alternatives",
            json!({ "team_id": 100, "practice_version_id": 1 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
