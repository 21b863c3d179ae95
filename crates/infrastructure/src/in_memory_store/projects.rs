use async_trait::async_trait;
use envkeep_application::ProjectRepository;
use envkeep_core::{AppError, AppResult};
use envkeep_domain::{Environment, EnvironmentId, Project, ProjectId};

use super::InMemoryStore;

#[async_trait]
impl ProjectRepository for InMemoryStore {
    async fn create_project(
        &self,
        project: Project,
        environments: Vec<Environment>,
    ) -> AppResult<()> {
        let mut projects = self.projects.write().await;
        let mut stored_environments = self.environments.write().await;

        if projects.values().any(|stored| stored.slug == project.slug) {
            return Err(AppError::Conflict(format!(
                "project slug '{}' is already taken",
                project.slug
            )));
        }

        stored_environments.extend(environments);
        projects.insert(project.id, project);
        Ok(())
    }

    async fn list_projects(&self) -> AppResult<Vec<Project>> {
        let mut values: Vec<Project> = self.projects.read().await.values().cloned().collect();
        values.sort_by(|left, right| {
            left.name
                .as_str()
                .cmp(right.name.as_str())
                .then_with(|| left.slug.as_str().cmp(right.slug.as_str()))
        });
        Ok(values)
    }

    async fn find_project(&self, project_id: ProjectId) -> AppResult<Option<Project>> {
        Ok(self.projects.read().await.get(&project_id).cloned())
    }

    async fn find_project_by_slug(&self, slug: &str) -> AppResult<Option<Project>> {
        Ok(self
            .projects
            .read()
            .await
            .values()
            .find(|project| project.slug.as_str() == slug)
            .cloned())
    }

    async fn list_environments(&self, project_id: ProjectId) -> AppResult<Vec<Environment>> {
        Ok(self
            .environments
            .read()
            .await
            .iter()
            .filter(|environment| environment.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn find_environment(
        &self,
        environment_id: EnvironmentId,
    ) -> AppResult<Option<Environment>> {
        Ok(self
            .environments
            .read()
            .await
            .iter()
            .find(|environment| environment.id == environment_id)
            .cloned())
    }

    async fn create_environment(&self, environment: Environment) -> AppResult<()> {
        let projects = self.projects.read().await;
        let mut environments = self.environments.write().await;

        if !projects.contains_key(&environment.project_id) {
            return Err(AppError::NotFound(format!(
                "project '{}' does not exist",
                environment.project_id
            )));
        }
        if environments.iter().any(|stored| {
            stored.project_id == environment.project_id && stored.slug == environment.slug
        }) {
            return Err(AppError::Conflict(format!(
                "environment slug '{}' already exists in project '{}'",
                environment.slug, environment.project_id
            )));
        }

        environments.push(environment);
        Ok(())
    }

    async fn delete_environment(&self, environment_id: EnvironmentId) -> AppResult<u64> {
        let mut environments = self.environments.write().await;
        let mut secrets = self.secrets.write().await;
        let mut members = self.members.write().await;

        let Some(index) = environments
            .iter()
            .position(|environment| environment.id == environment_id)
        else {
            return Err(AppError::NotFound(format!(
                "environment '{environment_id}' does not exist"
            )));
        };
        environments.remove(index);
        for environment in environments.iter_mut() {
            if environment.parent_id == Some(environment_id) {
                environment.parent_id = None;
            }
        }

        let before = secrets.len();
        secrets.retain(|_, secret| secret.environment_id != environment_id);
        let removed = before - secrets.len();

        for member in members.iter_mut() {
            member.environments.remove(&environment_id);
        }

        Ok(removed as u64)
    }
}
