use envkeep_application::{SearchResults, SecretKeyHit};
use envkeep_domain::AuditLogEntry;
use serde::Serialize;
use ts_rs::TS;

use super::projects::ProjectResponse;

/// API representation of an audit log entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    pub id: String,
    pub project_id: String,
    pub environment_id: Option<String>,
    pub secret_id: Option<String>,
    pub action: String,
    pub description: String,
    pub performed_by: String,
    pub timestamp: String,
}

/// A secret key matching a search query.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/secret-key-hit-response.ts"
)]
pub struct SecretKeyHitResponse {
    pub key: String,
    pub used_in: Vec<ProjectResponse>,
    pub usage_count: usize,
}

/// Search results grouped by kind.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/search-response.ts"
)]
pub struct SearchResponse {
    pub projects: Vec<ProjectResponse>,
    pub secrets: Vec<SecretKeyHitResponse>,
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(value: AuditLogEntry) -> Self {
        Self {
            id: value.id.to_string(),
            project_id: value.project_id.to_string(),
            environment_id: value
                .environment_id
                .map(|environment_id| environment_id.to_string()),
            secret_id: value.secret_id.map(|secret_id| secret_id.to_string()),
            action: value.action.as_str().to_owned(),
            description: value.description,
            performed_by: value.performed_by,
            timestamp: value.timestamp.to_rfc3339(),
        }
    }
}

impl From<SecretKeyHit> for SecretKeyHitResponse {
    fn from(value: SecretKeyHit) -> Self {
        Self {
            key: value.key.as_str().to_owned(),
            used_in: value
                .used_in
                .into_iter()
                .map(ProjectResponse::from)
                .collect(),
            usage_count: value.usage_count,
        }
    }
}

impl From<SearchResults> for SearchResponse {
    fn from(value: SearchResults) -> Self {
        Self {
            projects: value
                .projects
                .into_iter()
                .map(ProjectResponse::from)
                .collect(),
            secrets: value
                .secrets
                .into_iter()
                .map(SecretKeyHitResponse::from)
                .collect(),
        }
    }
}
