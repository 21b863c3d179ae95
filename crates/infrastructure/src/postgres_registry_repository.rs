use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use envkeep_application::{RegistryEntryPatch, RegistryRepository};
use envkeep_core::{AppError, AppResult};
use envkeep_domain::{ProjectId, RegistryEntry, RegistryEntryId, SecretKey};

/// PostgreSQL-backed repository for the per-project key registry.
#[derive(Clone)]
pub struct PostgresRegistryRepository {
    pool: PgPool,
}

impl PostgresRegistryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RegistryEntryRow {
    id: Uuid,
    project_id: Uuid,
    key: String,
    description: String,
    last_updated_at: DateTime<Utc>,
}

impl RegistryEntryRow {
    fn into_entry(self) -> AppResult<RegistryEntry> {
        Ok(RegistryEntry {
            id: RegistryEntryId::from_uuid(self.id),
            project_id: ProjectId::from_uuid(self.project_id),
            key: SecretKey::new(self.key)?,
            description: self.description,
            last_updated_at: self.last_updated_at,
        })
    }
}

#[async_trait]
impl RegistryRepository for PostgresRegistryRepository {
    async fn list_entries(&self, project_id: ProjectId) -> AppResult<Vec<RegistryEntry>> {
        let rows = sqlx::query_as::<_, RegistryEntryRow>(
            r#"
            SELECT id, project_id, key, description, last_updated_at
            FROM registry_entries
            WHERE project_id = $1
            ORDER BY key
            "#,
        )
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to list registry for project '{project_id}': {error}"
            ))
        })?;

        rows.into_iter().map(RegistryEntryRow::into_entry).collect()
    }

    async fn find_entry(
        &self,
        project_id: ProjectId,
        key: &SecretKey,
    ) -> AppResult<Option<RegistryEntry>> {
        let row = sqlx::query_as::<_, RegistryEntryRow>(
            r#"
            SELECT id, project_id, key, description, last_updated_at
            FROM registry_entries
            WHERE project_id = $1 AND key = $2
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to find registry entry '{key}' in project '{project_id}': {error}"
            ))
        })?;

        row.map(RegistryEntryRow::into_entry).transpose()
    }

    async fn upsert_entry(
        &self,
        project_id: ProjectId,
        key: &SecretKey,
        patch: RegistryEntryPatch,
    ) -> AppResult<RegistryEntry> {
        let row = sqlx::query_as::<_, RegistryEntryRow>(
            r#"
            INSERT INTO registry_entries (id, project_id, key, description, last_updated_at)
            VALUES ($1, $2, $3, COALESCE($4, ''), COALESCE($5, 'epoch'::TIMESTAMPTZ))
            ON CONFLICT (project_id, key) DO UPDATE
            SET
                description = COALESCE($4, registry_entries.description),
                last_updated_at = GREATEST(
                    registry_entries.last_updated_at,
                    COALESCE($5, registry_entries.last_updated_at)
                )
            RETURNING id, project_id, key, description, last_updated_at
            "#,
        )
        .bind(RegistryEntryId::new().as_uuid())
        .bind(project_id.as_uuid())
        .bind(key.as_str())
        .bind(patch.description)
        .bind(patch.last_updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to update registry entry '{key}' in project '{project_id}': {error}"
            ))
        })?;

        row.into_entry()
    }
}
