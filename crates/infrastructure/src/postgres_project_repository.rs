use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use envkeep_application::ProjectRepository;
use envkeep_core::{AppError, AppResult, NonEmptyString};
use envkeep_domain::{Environment, EnvironmentId, Project, ProjectId, Slug};

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for projects and their environments.
#[derive(Clone)]
pub struct PostgresProjectRepository {
    pool: PgPool,
}

impl PostgresProjectRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
}

impl ProjectRow {
    fn into_project(self) -> AppResult<Project> {
        Ok(Project {
            id: ProjectId::from_uuid(self.id),
            name: NonEmptyString::new(self.name)?,
            slug: Slug::new(self.slug)?,
            description: self.description,
        })
    }
}

#[derive(Debug, FromRow)]
struct EnvironmentRow {
    id: Uuid,
    project_id: Uuid,
    name: String,
    slug: String,
    is_production: bool,
    parent_id: Option<Uuid>,
}

impl EnvironmentRow {
    fn into_environment(self) -> AppResult<Environment> {
        Ok(Environment {
            id: EnvironmentId::from_uuid(self.id),
            project_id: ProjectId::from_uuid(self.project_id),
            name: NonEmptyString::new(self.name)?,
            slug: Slug::new(self.slug)?,
            is_production: self.is_production,
            parent_id: self.parent_id.map(EnvironmentId::from_uuid),
        })
    }
}

fn slug_conflict(error: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(database_error) = error {
        return database_error.code().as_deref() == Some("23505");
    }
    false
}

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn create_project(
        &self,
        project: Project,
        environments: Vec<Environment>,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Storage(format!(
                "failed to start project create transaction for '{}': {error}",
                project.slug
            ))
        })?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO projects (id, name, slug, description)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(project.id.as_uuid())
        .bind(project.name.as_str())
        .bind(project.slug.as_str())
        .bind(project.description.as_str())
        .execute(&mut *transaction)
        .await;

        if let Err(error) = inserted {
            if slug_conflict(&error) {
                return Err(AppError::Conflict(format!(
                    "project slug '{}' is already taken",
                    project.slug
                )));
            }
            return Err(AppError::Storage(format!(
                "failed to create project '{}': {error}",
                project.slug
            )));
        }

        for environment in &environments {
            sqlx::query(
                r#"
                INSERT INTO environments (id, project_id, name, slug, is_production, parent_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(environment.id.as_uuid())
            .bind(project.id.as_uuid())
            .bind(environment.name.as_str())
            .bind(environment.slug.as_str())
            .bind(environment.is_production)
            .bind(environment.parent_id.map(|parent_id| parent_id.as_uuid()))
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Storage(format!(
                    "failed to create environment '{}' for project '{}': {error}",
                    environment.slug, project.slug
                ))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Storage(format!(
                "failed to commit project create transaction for '{}': {error}",
                project.slug
            ))
        })
    }

    async fn list_projects(&self) -> AppResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, name, slug, description
            FROM projects
            ORDER BY name, slug
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to list projects: {error}")))?;

        rows.into_iter().map(ProjectRow::into_project).collect()
    }

    async fn find_project(&self, project_id: ProjectId) -> AppResult<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, name, slug, description
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(project_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!("failed to find project '{project_id}': {error}"))
        })?;

        row.map(ProjectRow::into_project).transpose()
    }

    async fn find_project_by_slug(&self, slug: &str) -> AppResult<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, name, slug, description
            FROM projects
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!("failed to find project by slug '{slug}': {error}"))
        })?;

        row.map(ProjectRow::into_project).transpose()
    }

    async fn list_environments(&self, project_id: ProjectId) -> AppResult<Vec<Environment>> {
        let rows = sqlx::query_as::<_, EnvironmentRow>(
            r#"
            SELECT id, project_id, name, slug, is_production, parent_id
            FROM environments
            WHERE project_id = $1
            ORDER BY position
            "#,
        )
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to list environments for project '{project_id}': {error}"
            ))
        })?;

        rows.into_iter()
            .map(EnvironmentRow::into_environment)
            .collect()
    }

    async fn find_environment(
        &self,
        environment_id: EnvironmentId,
    ) -> AppResult<Option<Environment>> {
        let row = sqlx::query_as::<_, EnvironmentRow>(
            r#"
            SELECT id, project_id, name, slug, is_production, parent_id
            FROM environments
            WHERE id = $1
            "#,
        )
        .bind(environment_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to find environment '{environment_id}': {error}"
            ))
        })?;

        row.map(EnvironmentRow::into_environment).transpose()
    }

    async fn create_environment(&self, environment: Environment) -> AppResult<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO environments (id, project_id, name, slug, is_production, parent_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(environment.id.as_uuid())
        .bind(environment.project_id.as_uuid())
        .bind(environment.name.as_str())
        .bind(environment.slug.as_str())
        .bind(environment.is_production)
        .bind(environment.parent_id.map(|parent_id| parent_id.as_uuid()))
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(error) if slug_conflict(&error) => Err(AppError::Conflict(format!(
                "environment slug '{}' already exists in project '{}'",
                environment.slug, environment.project_id
            ))),
            Err(error) => Err(AppError::Storage(format!(
                "failed to create environment '{}': {error}",
                environment.slug
            ))),
        }
    }

    async fn delete_environment(&self, environment_id: EnvironmentId) -> AppResult<u64> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Storage(format!(
                "failed to start environment delete transaction for '{environment_id}': {error}"
            ))
        })?;

        let removed_secrets = sqlx::query("DELETE FROM secrets WHERE environment_id = $1")
            .bind(environment_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Storage(format!(
                    "failed to delete secrets of environment '{environment_id}': {error}"
                ))
            })?
            .rows_affected();

        sqlx::query(
            r#"
            UPDATE project_members
            SET environment_ids = array_remove(environment_ids, $1)
            WHERE $1 = ANY(environment_ids)
            "#,
        )
        .bind(environment_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to revoke grants on environment '{environment_id}': {error}"
            ))
        })?;

        let deleted = sqlx::query("DELETE FROM environments WHERE id = $1")
            .bind(environment_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Storage(format!(
                    "failed to delete environment '{environment_id}': {error}"
                ))
            })?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "environment '{environment_id}' does not exist"
            )));
        }

        transaction.commit().await.map_err(|error| {
            AppError::Storage(format!(
                "failed to commit environment delete transaction for '{environment_id}': {error}"
            ))
        })?;

        debug!(%environment_id, removed_secrets, "deleted environment");
        Ok(removed_secrets)
    }
}
