use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use envkeep_core::UserIdentity;
use envkeep_domain::{EnvironmentId, ProjectId};
use serde::Deserialize;

use crate::dto::AuditLogEntryResponse;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditLogListQuery {
    pub environment_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(project_id): Path<String>,
    Query(query): Query<AuditLogListQuery>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    let project_id = project_id.parse::<ProjectId>()?;
    let environment_id = query
        .environment_id
        .as_deref()
        .map(str::parse::<EnvironmentId>)
        .transpose()?;

    let entries = state
        .audit_service
        .list_audit_log(
            &user,
            project_id,
            environment_id,
            query.limit.unwrap_or(50),
            query.offset.unwrap_or(0),
        )
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}
