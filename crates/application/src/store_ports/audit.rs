use std::collections::BTreeSet;

use async_trait::async_trait;
use envkeep_core::AppResult;
use envkeep_domain::{AuditLogEntry, EnvironmentId, ProjectId, SecretId};

/// Query parameters for audit log listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Project scope.
    pub project_id: ProjectId,
    /// Restricts to one environment.
    pub environment_id: Option<EnvironmentId>,
    /// Restricts to entries scoped to one of these environments.
    pub visible_environment_ids: Option<BTreeSet<EnvironmentId>>,
    /// Restricts to entries about one secret.
    pub secret_id: Option<SecretId>,
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
}

impl AuditLogQuery {
    /// Creates an unfiltered query for a project.
    #[must_use]
    pub fn for_project(project_id: ProjectId) -> Self {
        Self {
            project_id,
            environment_id: None,
            visible_environment_ids: None,
            secret_id: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Port for the append-only audit log.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit entry.
    async fn append_entry(&self, entry: AuditLogEntry) -> AppResult<()>;

    /// Lists matching entries newest first.
    async fn list_audit_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>>;
}
