use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use envkeep_application::{SecretRepository, SecretWrite};
use envkeep_core::{AppError, AppResult};
use envkeep_domain::{EnvironmentId, ProjectId, Secret, SecretId, SecretKey};

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for per-environment secret values.
#[derive(Clone)]
pub struct PostgresSecretRepository {
    pool: PgPool,
}

impl PostgresSecretRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SecretRow {
    id: Uuid,
    project_id: Uuid,
    environment_id: Uuid,
    key: String,
    value: String,
    version: i32,
    updated_at: DateTime<Utc>,
    last_changed_by: String,
}

impl SecretRow {
    fn into_secret(self) -> AppResult<Secret> {
        let version = u32::try_from(self.version).map_err(|_| {
            AppError::Internal(format!(
                "secret '{}' has invalid stored version {}",
                self.id, self.version
            ))
        })?;

        Ok(Secret {
            id: SecretId::from_uuid(self.id),
            project_id: ProjectId::from_uuid(self.project_id),
            environment_id: EnvironmentId::from_uuid(self.environment_id),
            key: SecretKey::new(self.key)?,
            value: self.value,
            version,
            updated_at: self.updated_at,
            last_changed_by: self.last_changed_by,
        })
    }
}

fn into_secrets(rows: Vec<SecretRow>) -> AppResult<Vec<Secret>> {
    rows.into_iter().map(SecretRow::into_secret).collect()
}

#[async_trait]
impl SecretRepository for PostgresSecretRepository {
    async fn list_secrets(
        &self,
        project_id: ProjectId,
        environment_id: Option<EnvironmentId>,
    ) -> AppResult<Vec<Secret>> {
        let rows = sqlx::query_as::<_, SecretRow>(
            r#"
            SELECT id, project_id, environment_id, key, value, version, updated_at, last_changed_by
            FROM secrets
            WHERE project_id = $1
                AND ($2::UUID IS NULL OR environment_id = $2)
            ORDER BY key, environment_id
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(environment_id.map(|environment_id| environment_id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to list secrets for project '{project_id}': {error}"
            ))
        })?;

        into_secrets(rows)
    }

    async fn list_secrets_by_key(
        &self,
        project_id: ProjectId,
        key: &SecretKey,
    ) -> AppResult<Vec<Secret>> {
        let rows = sqlx::query_as::<_, SecretRow>(
            r#"
            SELECT id, project_id, environment_id, key, value, version, updated_at, last_changed_by
            FROM secrets
            WHERE project_id = $1 AND key = $2
            ORDER BY environment_id
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(key.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to list values of '{key}' in project '{project_id}': {error}"
            ))
        })?;

        into_secrets(rows)
    }

    async fn find_secret(&self, secret_id: SecretId) -> AppResult<Option<Secret>> {
        let row = sqlx::query_as::<_, SecretRow>(
            r#"
            SELECT id, project_id, environment_id, key, value, version, updated_at, last_changed_by
            FROM secrets
            WHERE id = $1
            "#,
        )
        .bind(secret_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!("failed to find secret '{secret_id}': {error}"))
        })?;

        row.map(SecretRow::into_secret).transpose()
    }

    async fn upsert_secret(&self, write: SecretWrite) -> AppResult<Secret> {
        let row = sqlx::query_as::<_, SecretRow>(
            r#"
            INSERT INTO secrets (
                id, project_id, environment_id, key, value, version, updated_at, last_changed_by
            )
            SELECT $1, environments.project_id, environments.id, $4, $5, 1, $6, $7
            FROM environments
            WHERE environments.id = $3 AND environments.project_id = $2
            ON CONFLICT (environment_id, key) DO UPDATE
            SET
                value = EXCLUDED.value,
                version = secrets.version + 1,
                updated_at = EXCLUDED.updated_at,
                last_changed_by = EXCLUDED.last_changed_by
            RETURNING
                id, project_id, environment_id, key, value, version, updated_at, last_changed_by
            "#,
        )
        .bind(SecretId::new().as_uuid())
        .bind(write.project_id.as_uuid())
        .bind(write.environment_id.as_uuid())
        .bind(write.key.as_str())
        .bind(write.value.as_str())
        .bind(write.written_at)
        .bind(write.actor.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to write secret '{}' in environment '{}': {error}",
                write.key, write.environment_id
            ))
        })?;

        let row = row.ok_or_else(|| {
            AppError::NotFound(format!(
                "environment '{}' does not exist in project '{}'",
                write.environment_id, write.project_id
            ))
        })?;

        row.into_secret()
    }

    async fn touch_secret(&self, secret_id: SecretId, at: DateTime<Utc>) -> AppResult<Secret> {
        let row = sqlx::query_as::<_, SecretRow>(
            r#"
            UPDATE secrets
            SET updated_at = $2
            WHERE id = $1
            RETURNING
                id, project_id, environment_id, key, value, version, updated_at, last_changed_by
            "#,
        )
        .bind(secret_id.as_uuid())
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!("failed to touch secret '{secret_id}': {error}"))
        })?;

        row.ok_or_else(|| AppError::NotFound(format!("secret '{secret_id}' does not exist")))?
            .into_secret()
    }

    async fn delete_secret(&self, secret_id: SecretId) -> AppResult<Secret> {
        let row = sqlx::query_as::<_, SecretRow>(
            r#"
            DELETE FROM secrets
            WHERE id = $1
            RETURNING
                id, project_id, environment_id, key, value, version, updated_at, last_changed_by
            "#,
        )
        .bind(secret_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!("failed to delete secret '{secret_id}': {error}"))
        })?;

        row.ok_or_else(|| AppError::NotFound(format!("secret '{secret_id}' does not exist")))?
            .into_secret()
    }
}
