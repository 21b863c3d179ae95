use std::collections::BTreeSet;
use std::sync::Arc;

use envkeep_core::{AppError, AppResult, UserIdentity};
use envkeep_domain::{Environment, EnvironmentId, Project, ProjectId};

use crate::{MemberRepository, ProjectRepository};

/// Resolves which projects and environments an identity may see.
///
/// Admins see everything. Other identities see a project only when their
/// member row grants at least one environment, and then only those
/// environments.
#[derive(Clone)]
pub struct AccessService {
    projects: Arc<dyn ProjectRepository>,
    members: Arc<dyn MemberRepository>,
}

impl AccessService {
    /// Creates a new access service.
    #[must_use]
    pub fn new(projects: Arc<dyn ProjectRepository>, members: Arc<dyn MemberRepository>) -> Self {
        Self { projects, members }
    }

    /// Fails with `Forbidden` unless the identity is an admin.
    pub fn require_admin(&self, actor: &UserIdentity) -> AppResult<()> {
        if actor.is_admin() {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{}' is not an administrator",
            actor.subject()
        )))
    }

    /// Loads a project or fails with `NotFound`.
    pub async fn require_project(&self, project_id: ProjectId) -> AppResult<Project> {
        self.projects
            .find_project(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("project '{project_id}' does not exist")))
    }

    /// Loads a project the identity can see, failing with `Forbidden` otherwise.
    pub async fn require_project_access(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
    ) -> AppResult<Project> {
        let project = self.require_project(project_id).await?;
        if actor.is_admin() {
            return Ok(project);
        }

        let granted = self
            .members
            .find_member(project_id, actor.subject())
            .await?
            .is_some_and(|member| member.grants_project_access());

        if !granted {
            return Err(AppError::Forbidden(format!(
                "subject '{}' has no access to project '{}'",
                actor.subject(),
                project.slug
            )));
        }

        Ok(project)
    }

    /// Lists the projects visible to an identity.
    pub async fn visible_projects(&self, actor: &UserIdentity) -> AppResult<Vec<Project>> {
        let projects = self.projects.list_projects().await?;
        if actor.is_admin() {
            return Ok(projects);
        }

        let granted: BTreeSet<ProjectId> = self
            .members
            .list_memberships(actor.subject())
            .await?
            .into_iter()
            .filter(|member| member.grants_project_access())
            .map(|member| member.project_id)
            .collect();

        Ok(projects
            .into_iter()
            .filter(|project| granted.contains(&project.id))
            .collect())
    }

    /// Lists the project's environments visible to an identity.
    ///
    /// A missing member row yields an empty list rather than an error.
    pub async fn visible_environments(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
    ) -> AppResult<Vec<Environment>> {
        let environments = self.projects.list_environments(project_id).await?;
        if actor.is_admin() {
            return Ok(environments);
        }

        let Some(member) = self
            .members
            .find_member(project_id, actor.subject())
            .await?
        else {
            return Ok(Vec::new());
        };

        Ok(environments
            .into_iter()
            .filter(|environment| member.can_access(environment.id))
            .collect())
    }

    /// Ids of the visible environments, or `None` when the identity sees all of them.
    pub async fn visible_environment_ids(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
    ) -> AppResult<Option<BTreeSet<EnvironmentId>>> {
        if actor.is_admin() {
            return Ok(None);
        }

        let visible = self.visible_environments(actor, project_id).await?;
        Ok(Some(visible.into_iter().map(|environment| environment.id).collect()))
    }

    /// Loads an environment the identity can see.
    pub async fn require_environment(
        &self,
        actor: &UserIdentity,
        environment_id: EnvironmentId,
    ) -> AppResult<Environment> {
        let environment = self
            .projects
            .find_environment(environment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("environment '{environment_id}' does not exist"))
            })?;

        if actor.is_admin() {
            return Ok(environment);
        }

        let allowed = self
            .members
            .find_member(environment.project_id, actor.subject())
            .await?
            .is_some_and(|member| member.can_access(environment_id));

        if !allowed {
            return Err(AppError::Forbidden(format!(
                "subject '{}' has no access to environment '{}'",
                actor.subject(),
                environment.slug
            )));
        }

        Ok(environment)
    }

    /// Loads a visible environment and checks that it belongs to the project.
    pub async fn require_project_environment(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        environment_id: EnvironmentId,
    ) -> AppResult<Environment> {
        let environment = self.require_environment(actor, environment_id).await?;
        if environment.project_id != project_id {
            return Err(AppError::NotFound(format!(
                "environment '{environment_id}' does not belong to project '{project_id}'"
            )));
        }

        Ok(environment)
    }
}
