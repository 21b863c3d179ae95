use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use envkeep_application::CreateEnvironmentInput;
use envkeep_core::UserIdentity;
use envkeep_domain::{EnvironmentId, ProjectId};

use crate::dto::{
    CreateEnvironmentRequest, CreateProjectRequest, EnvironmentResponse, ProjectDetailResponse,
    ProjectResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_projects_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let projects = state
        .project_service
        .list_projects(&user)
        .await?
        .into_iter()
        .map(ProjectResponse::from)
        .collect();

    Ok(Json(projects))
}

pub async fn create_project_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectDetailResponse>)> {
    let project = state
        .project_service
        .create_project(&user, payload.name.as_str(), payload.description.as_str())
        .await?;

    Ok((StatusCode::CREATED, Json(ProjectDetailResponse::from(project))))
}

pub async fn project_by_slug_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ProjectDetailResponse>> {
    let project = state
        .project_service
        .project_by_slug(&user, slug.as_str())
        .await?;

    Ok(Json(ProjectDetailResponse::from(project)))
}

pub async fn create_environment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(project_id): Path<String>,
    Json(payload): Json<CreateEnvironmentRequest>,
) -> ApiResult<(StatusCode, Json<EnvironmentResponse>)> {
    let project_id = project_id.parse::<ProjectId>()?;
    let parent_id = payload
        .parent_id
        .as_deref()
        .map(str::parse::<EnvironmentId>)
        .transpose()?;

    let environment = state
        .project_service
        .create_environment(
            &user,
            project_id,
            CreateEnvironmentInput {
                name: payload.name,
                slug: payload.slug,
                is_production: payload.is_production,
                parent_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(EnvironmentResponse::from(environment))))
}

pub async fn delete_environment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(environment_id): Path<String>,
) -> ApiResult<StatusCode> {
    let environment_id = environment_id.parse::<EnvironmentId>()?;
    state
        .project_service
        .delete_environment(&user, environment_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
