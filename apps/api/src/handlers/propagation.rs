use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use envkeep_application::CommittedValue;
use envkeep_core::{AppError, UserIdentity};
use envkeep_domain::{EnvironmentId, ProjectId, SecretKey};
use tracing::info;

use crate::dto::{CommitRequest, CommitResponse, PropagateRequest, PropagationReportResponse};
use crate::error::{ApiCommitError, ApiResult};
use crate::state::AppState;

#[cfg(test)]
mod tests;

/// Stages the submitted drafts against stored state and commits them.
pub async fn commit_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((project_id, environment_id)): Path<(String, String)>,
    Json(payload): Json<CommitRequest>,
) -> Result<Json<CommitResponse>, ApiCommitError> {
    let project_id = project_id.parse::<ProjectId>()?;
    let environment_id = environment_id.parse::<EnvironmentId>()?;

    let mut session = state
        .propagation_service
        .open_session(&user, project_id, environment_id)
        .await?;
    for (key, value) in payload.values {
        session.stage_value(key.as_str(), value)?;
    }
    for (key, description) in payload.descriptions {
        session.stage_description(key.as_str(), description)?;
    }

    let outcome = state.propagation_service.commit(&user, session).await?;
    Ok(Json(CommitResponse::from(outcome)))
}

/// Copies committed values into the selected targets.
///
/// Responds 207 when at least one target failed; the body lists which.
pub async fn propagate_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(project_id): Path<String>,
    Json(payload): Json<PropagateRequest>,
) -> ApiResult<(StatusCode, Json<PropagationReportResponse>)> {
    let project_id = project_id.parse::<ProjectId>()?;
    let source_environment_id = payload.source_environment_id.parse::<EnvironmentId>()?;
    let values = payload
        .values
        .into_iter()
        .map(|value| {
            Ok(CommittedValue {
                key: SecretKey::new(value.key)?,
                value: value.value,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;
    let selected = payload
        .target_environment_ids
        .iter()
        .map(|environment_id| environment_id.parse::<EnvironmentId>())
        .collect::<Result<Vec<_>, AppError>>()?;

    let offer = state
        .propagation_service
        .offer(&user, project_id, source_environment_id, values)
        .await?
        .ok_or_else(|| {
            AppError::Validation("there is nothing to propagate from this environment".to_owned())
        })?;

    let report = state
        .propagation_service
        .propagate(&user, &offer, selected.as_slice())
        .await?;

    let status = if report.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    info!(
        %project_id,
        %source_environment_id,
        complete = report.is_complete(),
        "propagation request served"
    );

    Ok((status, Json(PropagationReportResponse::from(report))))
}
