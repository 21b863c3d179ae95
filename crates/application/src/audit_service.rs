use std::sync::Arc;

use envkeep_core::{AppResult, UserIdentity};
use envkeep_domain::{AuditAction, AuditEntryId, AuditLogEntry, EnvironmentId, ProjectId, SecretId};

use crate::{AccessService, AuditLogQuery, AuditRepository, Clock};

/// Audit event emitted by mutating workflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Project scope for the event.
    pub project_id: ProjectId,
    /// Environment scope, when the action targets one.
    pub environment_id: Option<EnvironmentId>,
    /// Secret the action touched.
    pub secret_id: Option<SecretId>,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Human-readable description.
    pub description: String,
}

/// Appends and reads the project audit trail.
#[derive(Clone)]
pub struct AuditService {
    access: AccessService,
    repository: Arc<dyn AuditRepository>,
    clock: Arc<dyn Clock>,
}

impl AuditService {
    /// Creates a new audit service.
    #[must_use]
    pub fn new(
        access: AccessService,
        repository: Arc<dyn AuditRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            access,
            repository,
            clock,
        }
    }

    /// Stamps and appends one event performed by `actor`.
    pub async fn record(
        &self,
        actor: &UserIdentity,
        event: AuditEvent,
    ) -> AppResult<AuditLogEntry> {
        let entry = AuditLogEntry {
            id: AuditEntryId::new(),
            project_id: event.project_id,
            environment_id: event.environment_id,
            secret_id: event.secret_id,
            action: event.action,
            description: event.description,
            timestamp: self.clock.now(),
            performed_by: actor.actor_label().to_owned(),
        };

        self.repository.append_entry(entry.clone()).await?;
        Ok(entry)
    }

    /// Lists project audit entries newest first.
    ///
    /// Non-admins only see entries scoped to an environment they can see.
    pub async fn list_audit_log(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        environment_id: Option<EnvironmentId>,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<AuditLogEntry>> {
        self.access.require_project_access(actor, project_id).await?;
        if let Some(environment_id) = environment_id {
            self.access
                .require_project_environment(actor, project_id, environment_id)
                .await?;
        }

        let visible_environment_ids = self
            .access
            .visible_environment_ids(actor, project_id)
            .await?;

        self.repository
            .list_audit_entries(AuditLogQuery {
                project_id,
                environment_id,
                visible_environment_ids,
                secret_id: None,
                limit: limit.clamp(1, 500),
                offset,
            })
            .await
    }

    /// Lists entries about one secret newest first. Callers check access.
    pub(crate) async fn entries_for_secret(
        &self,
        project_id: ProjectId,
        secret_id: SecretId,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let mut query = AuditLogQuery::for_project(project_id);
        query.secret_id = Some(secret_id);
        query.limit = 500;
        self.repository.list_audit_entries(query).await
    }
}
