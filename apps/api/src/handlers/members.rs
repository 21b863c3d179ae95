use std::collections::BTreeSet;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use envkeep_core::{AppError, UserIdentity};
use envkeep_domain::{EnvironmentId, MemberId, ProjectId};

use crate::dto::{AddMemberRequest, MemberResponse, UpdateMemberRequest};
use crate::error::ApiResult;
use crate::state::AppState;

fn parse_environment_ids(values: &[String]) -> Result<BTreeSet<EnvironmentId>, AppError> {
    values
        .iter()
        .map(|value| value.parse::<EnvironmentId>())
        .collect()
}

pub async fn list_members_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Vec<MemberResponse>>> {
    let project_id = project_id.parse::<ProjectId>()?;
    let members = state
        .member_service
        .list_members(&user, project_id)
        .await?
        .into_iter()
        .map(MemberResponse::from)
        .collect();

    Ok(Json(members))
}

pub async fn add_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(project_id): Path<String>,
    Json(payload): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<MemberResponse>)> {
    let project_id = project_id.parse::<ProjectId>()?;
    let environments = parse_environment_ids(&payload.environment_ids)?;

    let member = state
        .member_service
        .add_member(&user, project_id, payload.email.as_str(), environments)
        .await?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(member))))
}

pub async fn update_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((project_id, member_id)): Path<(String, String)>,
    Json(payload): Json<UpdateMemberRequest>,
) -> ApiResult<Json<MemberResponse>> {
    let project_id = project_id.parse::<ProjectId>()?;
    let member_id = member_id.parse::<MemberId>()?;
    let environments = parse_environment_ids(&payload.environment_ids)?;

    let member = state
        .member_service
        .update_member(&user, project_id, member_id, environments)
        .await?;

    Ok(Json(MemberResponse::from(member)))
}

pub async fn remove_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((project_id, member_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let project_id = project_id.parse::<ProjectId>()?;
    let member_id = member_id.parse::<MemberId>()?;
    state
        .member_service
        .remove_member(&user, project_id, member_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
