use async_trait::async_trait;
use chrono::{DateTime, Utc};
use envkeep_core::AppResult;
use envkeep_domain::{EnvironmentId, ProjectId, Secret, SecretId, SecretKey};

/// One value write addressed by (project, environment, key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretWrite {
    /// Project scope.
    pub project_id: ProjectId,
    /// Target environment.
    pub environment_id: EnvironmentId,
    /// Secret key.
    pub key: SecretKey,
    /// New value.
    pub value: String,
    /// Label of the writer.
    pub actor: String,
    /// Write timestamp.
    pub written_at: DateTime<Utc>,
}

/// Repository port for per-environment secret values.
#[async_trait]
pub trait SecretRepository: Send + Sync {
    /// Lists secrets in a project, optionally restricted to one environment.
    async fn list_secrets(
        &self,
        project_id: ProjectId,
        environment_id: Option<EnvironmentId>,
    ) -> AppResult<Vec<Secret>>;

    /// Lists every environment's copy of one key.
    async fn list_secrets_by_key(
        &self,
        project_id: ProjectId,
        key: &SecretKey,
    ) -> AppResult<Vec<Secret>>;

    /// Finds a secret by id.
    async fn find_secret(&self, secret_id: SecretId) -> AppResult<Option<Secret>>;

    /// Creates the secret at version 1 or overwrites it and bumps its version.
    ///
    /// Last write wins; the version is recorded, never checked.
    async fn upsert_secret(&self, write: SecretWrite) -> AppResult<Secret>;

    /// Moves `updated_at` without touching value or version.
    async fn touch_secret(&self, secret_id: SecretId, at: DateTime<Utc>) -> AppResult<Secret>;

    /// Removes one environment's copy and returns it.
    async fn delete_secret(&self, secret_id: SecretId) -> AppResult<Secret>;
}
