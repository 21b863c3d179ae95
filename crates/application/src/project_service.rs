use std::sync::Arc;

use tracing::info;

use envkeep_core::{AppError, AppResult, UserIdentity};
use envkeep_domain::{AuditAction, Environment, EnvironmentId, Project, ProjectId, Slug};

use crate::{AccessService, AuditEvent, AuditService, ProjectRepository};

#[cfg(test)]
mod tests;

/// Project with the environments visible to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectView {
    /// Project record.
    pub project: Project,
    /// Visible environments in creation order.
    pub environments: Vec<Environment>,
}

/// Input payload for creating an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEnvironmentInput {
    /// Display name.
    pub name: String,
    /// Explicit slug; derived from the name when absent.
    pub slug: Option<String>,
    /// Marks production environments.
    pub is_production: bool,
    /// Parent environment in the same project.
    pub parent_id: Option<EnvironmentId>,
}

/// Application service for project and environment lifecycle.
#[derive(Clone)]
pub struct ProjectService {
    access: AccessService,
    repository: Arc<dyn ProjectRepository>,
    audit: AuditService,
}

impl ProjectService {
    /// Creates a new project service.
    #[must_use]
    pub fn new(
        access: AccessService,
        repository: Arc<dyn ProjectRepository>,
        audit: AuditService,
    ) -> Self {
        Self {
            access,
            repository,
            audit,
        }
    }

    /// Creates a project with the default Development, Staging and Production environments.
    pub async fn create_project(
        &self,
        actor: &UserIdentity,
        name: &str,
        description: &str,
    ) -> AppResult<ProjectView> {
        self.access.require_admin(actor)?;

        let project = Project::new(name, description)?;
        if self
            .repository
            .find_project_by_slug(project.slug.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "project slug '{}' is already taken",
                project.slug
            )));
        }

        let environments = Environment::defaults_for(project.id)?;
        self.repository
            .create_project(project.clone(), environments.clone())
            .await?;

        self.audit
            .record(
                actor,
                AuditEvent {
                    project_id: project.id,
                    environment_id: None,
                    secret_id: None,
                    action: AuditAction::ProjectCreate,
                    description: format!("Created project {}", project.name),
                },
            )
            .await?;

        info!(project = %project.slug, "project created");

        Ok(ProjectView {
            project,
            environments,
        })
    }

    /// Lists projects visible to the caller.
    pub async fn list_projects(&self, actor: &UserIdentity) -> AppResult<Vec<Project>> {
        self.access.visible_projects(actor).await
    }

    /// Loads a project by slug with its visible environments.
    ///
    /// A caller without access gets the project with no environments.
    pub async fn project_by_slug(
        &self,
        actor: &UserIdentity,
        slug: &str,
    ) -> AppResult<ProjectView> {
        let project = self
            .repository
            .find_project_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("project '{slug}' does not exist")))?;
        let environments = self.access.visible_environments(actor, project.id).await?;

        Ok(ProjectView {
            project,
            environments,
        })
    }

    /// Adds an environment to a project.
    pub async fn create_environment(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        input: CreateEnvironmentInput,
    ) -> AppResult<Environment> {
        self.access.require_admin(actor)?;
        let project = self.access.require_project(project_id).await?;

        let slug = match input.slug {
            Some(slug) => Slug::new(slug)?,
            None => Slug::from_name(&input.name)?,
        };
        let existing = self.repository.list_environments(project_id).await?;

        if existing.iter().any(|environment| environment.slug == slug) {
            return Err(AppError::Conflict(format!(
                "environment slug '{slug}' already exists in project '{}'",
                project.slug
            )));
        }
        if let Some(parent_id) = input.parent_id
            && !existing.iter().any(|environment| environment.id == parent_id)
        {
            return Err(AppError::Validation(format!(
                "parent environment '{parent_id}' does not belong to project '{}'",
                project.slug
            )));
        }

        let environment = Environment::new(
            project_id,
            input.name,
            slug,
            input.is_production,
            input.parent_id,
        )?;
        self.repository
            .create_environment(environment.clone())
            .await?;

        self.audit
            .record(
                actor,
                AuditEvent {
                    project_id,
                    environment_id: Some(environment.id),
                    secret_id: None,
                    action: AuditAction::EnvironmentCreate,
                    description: format!("Created environment {}", environment.name),
                },
            )
            .await?;

        Ok(environment)
    }

    /// Deletes an environment together with every secret scoped to it.
    pub async fn delete_environment(
        &self,
        actor: &UserIdentity,
        environment_id: EnvironmentId,
    ) -> AppResult<Environment> {
        self.access.require_admin(actor)?;
        let environment = self
            .repository
            .find_environment(environment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("environment '{environment_id}' does not exist"))
            })?;

        let removed_secrets = self.repository.delete_environment(environment_id).await?;

        self.audit
            .record(
                actor,
                AuditEvent {
                    project_id: environment.project_id,
                    environment_id: None,
                    secret_id: None,
                    action: AuditAction::EnvironmentDelete,
                    description: format!(
                        "Deleted environment {} and {removed_secrets} secret(s)",
                        environment.name
                    ),
                },
            )
            .await?;

        Ok(environment)
    }
}
