use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use envkeep_core::UserIdentity;
use envkeep_infrastructure::SystemClock;

use super::{commit_handler, propagate_handler};
use crate::api_services::{RepositorySet, build_app_state};
use crate::dto::{CommitRequest, CommittedValueDto, PropagateRequest};
use crate::state::AppState;

fn admin() -> UserIdentity {
    UserIdentity::new("admin-1", Some("admin@example.com".to_owned()), true)
}

async fn seeded_state() -> (AppState, String, Vec<String>) {
    let state = build_app_state(
        RepositorySet::in_memory(Arc::new(SystemClock)),
        "proxy-secret".to_owned(),
        "http://localhost:3000".to_owned(),
    );
    let view = state
        .project_service
        .create_project(&admin(), "Storefront", "")
        .await
        .unwrap_or_else(|_| unreachable!());

    let environments = view
        .environments
        .iter()
        .map(|environment| environment.id.to_string())
        .collect();
    (state, view.project.id.to_string(), environments)
}

#[tokio::test]
async fn commit_returns_offer_for_the_other_environments() {
    let (state, project_id, environments) = seeded_state().await;

    let response = commit_handler(
        State(state),
        Extension(admin()),
        Path((project_id, environments[0].clone())),
        Json(CommitRequest {
            values: BTreeMap::from([("DATABASE_URL".to_owned(), "devurl".to_owned())]),
            descriptions: BTreeMap::from([("DATABASE_URL".to_owned(), "Primary DB".to_owned())]),
        }),
    )
    .await;

    let Json(body) = response.unwrap_or_else(|_| unreachable!());
    assert_eq!(body.committed.len(), 1);
    assert_eq!(body.described.len(), 1);

    let offer = body.offer.unwrap_or_else(|| unreachable!());
    assert_eq!(offer.source_environment_id, environments[0]);
    assert_eq!(offer.targets.len(), 2);
    assert_eq!(offer.values.len(), 1);
    assert_eq!(offer.values[0].value, "devurl");
}

#[tokio::test]
async fn commit_with_invalid_key_is_rejected_without_landed_keys() {
    let (state, project_id, environments) = seeded_state().await;

    let response = commit_handler(
        State(state),
        Extension(admin()),
        Path((project_id, environments[0].clone())),
        Json(CommitRequest {
            values: BTreeMap::from([("not a key".to_owned(), "x".to_owned())]),
            descriptions: BTreeMap::new(),
        }),
    )
    .await;

    let error = response.err().unwrap_or_else(|| unreachable!());
    assert!(error.0.landed_keys().is_empty());
    assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn propagate_writes_every_selected_target() {
    let (state, project_id, environments) = seeded_state().await;

    let response = propagate_handler(
        State(state),
        Extension(admin()),
        Path(project_id),
        Json(PropagateRequest {
            source_environment_id: environments[0].clone(),
            values: vec![CommittedValueDto {
                key: "API_KEY".to_owned(),
                value: "shared".to_owned(),
            }],
            target_environment_ids: environments[1..].to_vec(),
        }),
    )
    .await;

    let (status, Json(report)) = response.unwrap_or_else(|_| unreachable!());
    assert_eq!(status, StatusCode::OK);
    assert!(report.complete);
    assert_eq!(report.succeeded_targets.len(), 2);
    assert!(report.failed_targets.is_empty());
    assert!(report.applied.iter().all(|secret| secret.value == "shared"));
}

#[tokio::test]
async fn propagate_to_a_non_target_is_a_bad_request() {
    let (state, project_id, environments) = seeded_state().await;

    let response = propagate_handler(
        State(state),
        Extension(admin()),
        Path(project_id),
        Json(PropagateRequest {
            source_environment_id: environments[0].clone(),
            values: vec![CommittedValueDto {
                key: "API_KEY".to_owned(),
                value: "shared".to_owned(),
            }],
            target_environment_ids: vec![environments[0].clone()],
        }),
    )
    .await;

    let error = response.err().unwrap_or_else(|| unreachable!());
    assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn propagate_without_values_is_a_bad_request() {
    let (state, project_id, environments) = seeded_state().await;

    let response = propagate_handler(
        State(state),
        Extension(admin()),
        Path(project_id),
        Json(PropagateRequest {
            source_environment_id: environments[0].clone(),
            values: Vec::new(),
            target_environment_ids: environments[1..].to_vec(),
        }),
    )
    .await;

    let error = response.err().unwrap_or_else(|| unreachable!());
    assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
}
