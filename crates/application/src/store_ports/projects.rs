use async_trait::async_trait;
use envkeep_core::AppResult;
use envkeep_domain::{Environment, EnvironmentId, Project, ProjectId};

/// Repository port for projects and their environments.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Persists a project together with its initial environments.
    ///
    /// Fails with `Conflict` when the slug is taken.
    async fn create_project(&self, project: Project, environments: Vec<Environment>)
    -> AppResult<()>;

    /// Lists every project ordered by name.
    async fn list_projects(&self) -> AppResult<Vec<Project>>;

    /// Finds a project by id.
    async fn find_project(&self, project_id: ProjectId) -> AppResult<Option<Project>>;

    /// Finds a project by slug.
    async fn find_project_by_slug(&self, slug: &str) -> AppResult<Option<Project>>;

    /// Lists a project's environments in creation order.
    async fn list_environments(&self, project_id: ProjectId) -> AppResult<Vec<Environment>>;

    /// Finds an environment by id.
    async fn find_environment(
        &self,
        environment_id: EnvironmentId,
    ) -> AppResult<Option<Environment>>;

    /// Persists a new environment. Fails with `Conflict` when the slug is taken in the project.
    async fn create_environment(&self, environment: Environment) -> AppResult<()>;

    /// Deletes an environment, every secret scoped to it and its member grants.
    ///
    /// Returns the number of secrets removed.
    async fn delete_environment(&self, environment_id: EnvironmentId) -> AppResult<u64>;
}
