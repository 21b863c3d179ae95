use envkeep_application::ProjectView;
use envkeep_domain::{Environment, Project};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for project creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-project-request.ts"
)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Incoming payload for environment creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-environment-request.ts"
)]
pub struct CreateEnvironmentRequest {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub is_production: bool,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// API representation of a project.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/project-response.ts"
)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
}

/// API representation of an environment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/environment-response.ts"
)]
pub struct EnvironmentResponse {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub slug: String,
    pub is_production: bool,
    pub parent_id: Option<String>,
}

/// A project together with the environments visible to the caller.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/project-detail-response.ts"
)]
pub struct ProjectDetailResponse {
    pub project: ProjectResponse,
    pub environments: Vec<EnvironmentResponse>,
}

impl From<Project> for ProjectResponse {
    fn from(value: Project) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name.as_str().to_owned(),
            slug: value.slug.as_str().to_owned(),
            description: value.description,
        }
    }
}

impl From<Environment> for EnvironmentResponse {
    fn from(value: Environment) -> Self {
        Self {
            id: value.id.to_string(),
            project_id: value.project_id.to_string(),
            name: value.name.as_str().to_owned(),
            slug: value.slug.as_str().to_owned(),
            is_production: value.is_production,
            parent_id: value.parent_id.map(|parent_id| parent_id.to_string()),
        }
    }
}

impl From<ProjectView> for ProjectDetailResponse {
    fn from(value: ProjectView) -> Self {
        Self {
            project: value.project.into(),
            environments: value
                .environments
                .into_iter()
                .map(EnvironmentResponse::from)
                .collect(),
        }
    }
}
