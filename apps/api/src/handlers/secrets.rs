use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use envkeep_core::UserIdentity;
use envkeep_domain::{EnvironmentId, ProjectId, SecretId};
use serde::Deserialize;

use crate::dto::{
    AuditLogEntryResponse, KeyComparisonResponse, RegistryEntryResponse, SaveSecretRequest,
    SecretResponse, SyncRecordResponse, UpdateDescriptionRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SecretListQuery {
    pub environment_id: Option<String>,
}

pub async fn list_secrets_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(project_id): Path<String>,
    Query(query): Query<SecretListQuery>,
) -> ApiResult<Json<Vec<SecretResponse>>> {
    let project_id = project_id.parse::<ProjectId>()?;
    let environment_id = query
        .environment_id
        .as_deref()
        .map(str::parse::<EnvironmentId>)
        .transpose()?;

    let secrets = state
        .secret_service
        .list_secrets(&user, project_id, environment_id)
        .await?
        .into_iter()
        .map(SecretResponse::from)
        .collect();

    Ok(Json(secrets))
}

pub async fn save_secret_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((project_id, environment_id, key)): Path<(String, String, String)>,
    Json(payload): Json<SaveSecretRequest>,
) -> ApiResult<Json<SecretResponse>> {
    let project_id = project_id.parse::<ProjectId>()?;
    let environment_id = environment_id.parse::<EnvironmentId>()?;

    let secret = state
        .secret_service
        .save_secret(
            &user,
            project_id,
            environment_id,
            key.as_str(),
            payload.value.as_str(),
        )
        .await?;

    Ok(Json(SecretResponse::from(secret)))
}

pub async fn delete_secret_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(secret_id): Path<String>,
) -> ApiResult<StatusCode> {
    let secret_id = secret_id.parse::<SecretId>()?;
    state.secret_service.delete_secret(&user, secret_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_synced_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(secret_id): Path<String>,
) -> ApiResult<Json<SecretResponse>> {
    let secret_id = secret_id.parse::<SecretId>()?;
    let secret = state.secret_service.mark_synced(&user, secret_id).await?;

    Ok(Json(SecretResponse::from(secret)))
}

pub async fn secret_history_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(secret_id): Path<String>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    let secret_id = secret_id.parse::<SecretId>()?;
    let entries = state
        .secret_service
        .secret_history(&user, secret_id)
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}

pub async fn registry_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Vec<RegistryEntryResponse>>> {
    let project_id = project_id.parse::<ProjectId>()?;
    let entries = state
        .registry_service
        .registry(&user, project_id)
        .await?
        .into_iter()
        .map(RegistryEntryResponse::from)
        .collect();

    Ok(Json(entries))
}

pub async fn update_description_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((project_id, key)): Path<(String, String)>,
    Json(payload): Json<UpdateDescriptionRequest>,
) -> ApiResult<Json<RegistryEntryResponse>> {
    let project_id = project_id.parse::<ProjectId>()?;
    let entry = state
        .registry_service
        .update_description(
            &user,
            project_id,
            key.as_str(),
            payload.description.as_str(),
        )
        .await?;

    Ok(Json(RegistryEntryResponse::from(entry)))
}

pub async fn sync_status_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Vec<SyncRecordResponse>>> {
    let project_id = project_id.parse::<ProjectId>()?;
    let records = state
        .sync_service
        .evaluate(&user, project_id)
        .await?
        .into_iter()
        .map(SyncRecordResponse::from)
        .collect();

    Ok(Json(records))
}

pub async fn key_comparison_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((project_id, key)): Path<(String, String)>,
) -> ApiResult<Json<KeyComparisonResponse>> {
    let project_id = project_id.parse::<ProjectId>()?;
    let entry = state
        .registry_service
        .entry(&user, project_id, key.as_str())
        .await?;
    let values = state
        .secret_service
        .key_values(&user, project_id, key.as_str())
        .await?
        .into_iter()
        .map(SecretResponse::from)
        .collect();

    Ok(Json(KeyComparisonResponse {
        entry: entry.into(),
        values,
    }))
}
