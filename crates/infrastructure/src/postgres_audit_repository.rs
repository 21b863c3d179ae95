use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use envkeep_application::{AuditLogQuery, AuditRepository};
use envkeep_core::{AppError, AppResult};
use envkeep_domain::{AuditAction, AuditEntryId, AuditLogEntry, EnvironmentId, ProjectId, SecretId};

/// PostgreSQL-backed append-only audit log.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditEntryRow {
    id: Uuid,
    project_id: Uuid,
    environment_id: Option<Uuid>,
    secret_id: Option<Uuid>,
    action: String,
    description: String,
    performed_by: String,
    created_at: DateTime<Utc>,
}

impl AuditEntryRow {
    fn into_entry(self) -> AppResult<AuditLogEntry> {
        Ok(AuditLogEntry {
            id: AuditEntryId::from_uuid(self.id),
            project_id: ProjectId::from_uuid(self.project_id),
            environment_id: self.environment_id.map(EnvironmentId::from_uuid),
            secret_id: self.secret_id.map(SecretId::from_uuid),
            action: self.action.parse::<AuditAction>()?,
            description: self.description,
            timestamp: self.created_at,
            performed_by: self.performed_by,
        })
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_entry(&self, entry: AuditLogEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log_entries (
                id, project_id, environment_id, secret_id, action, description, performed_by,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.project_id.as_uuid())
        .bind(entry.environment_id.map(|environment_id| environment_id.as_uuid()))
        .bind(entry.secret_id.map(|secret_id| secret_id.as_uuid()))
        .bind(entry.action.as_str())
        .bind(entry.description.as_str())
        .bind(entry.performed_by.as_str())
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to append audit entry for project '{}': {error}",
                entry.project_id
            ))
        })?;

        Ok(())
    }

    async fn list_audit_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let visible: Option<Vec<Uuid>> = query.visible_environment_ids.as_ref().map(|ids| {
            ids.iter()
                .map(|environment_id| environment_id.as_uuid())
                .collect()
        });
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, AuditEntryRow>(
            r#"
            SELECT
                id,
                project_id,
                environment_id,
                secret_id,
                action,
                description,
                performed_by,
                created_at
            FROM audit_log_entries
            WHERE project_id = $1
                AND ($2::UUID IS NULL OR environment_id = $2)
                AND ($3::UUID[] IS NULL OR environment_id = ANY($3))
                AND ($4::UUID IS NULL OR secret_id = $4)
            ORDER BY created_at DESC, id
            LIMIT $5
            OFFSET $6
            "#,
        )
        .bind(query.project_id.as_uuid())
        .bind(query.environment_id.map(|environment_id| environment_id.as_uuid()))
        .bind(visible)
        .bind(query.secret_id.map(|secret_id| secret_id.as_uuid()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to list audit entries for project '{}': {error}",
                query.project_id
            ))
        })?;

        rows.into_iter().map(AuditEntryRow::into_entry).collect()
    }
}
