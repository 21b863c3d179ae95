use async_trait::async_trait;
use chrono::{DateTime, Utc};
use envkeep_application::{SecretRepository, SecretWrite};
use envkeep_core::{AppError, AppResult};
use envkeep_domain::{EnvironmentId, ProjectId, Secret, SecretId, SecretKey};

use super::InMemoryStore;

fn sorted(mut secrets: Vec<Secret>) -> Vec<Secret> {
    secrets.sort_by(|left, right| {
        left.key
            .cmp(&right.key)
            .then_with(|| left.environment_id.cmp(&right.environment_id))
    });
    secrets
}

#[async_trait]
impl SecretRepository for InMemoryStore {
    async fn list_secrets(
        &self,
        project_id: ProjectId,
        environment_id: Option<EnvironmentId>,
    ) -> AppResult<Vec<Secret>> {
        let secrets = self.secrets.read().await;

        Ok(sorted(
            secrets
                .values()
                .filter(|secret| secret.project_id == project_id)
                .filter(|secret| environment_id.is_none_or(|id| secret.environment_id == id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_secrets_by_key(
        &self,
        project_id: ProjectId,
        key: &SecretKey,
    ) -> AppResult<Vec<Secret>> {
        let secrets = self.secrets.read().await;

        Ok(sorted(
            secrets
                .values()
                .filter(|secret| secret.project_id == project_id && &secret.key == key)
                .cloned()
                .collect(),
        ))
    }

    async fn find_secret(&self, secret_id: SecretId) -> AppResult<Option<Secret>> {
        Ok(self.secrets.read().await.get(&secret_id).cloned())
    }

    async fn upsert_secret(&self, write: SecretWrite) -> AppResult<Secret> {
        let environments = self.environments.read().await;
        let mut secrets = self.secrets.write().await;

        if !environments.iter().any(|environment| {
            environment.id == write.environment_id && environment.project_id == write.project_id
        }) {
            return Err(AppError::NotFound(format!(
                "environment '{}' does not exist in project '{}'",
                write.environment_id, write.project_id
            )));
        }

        if let Some(secret) = secrets.values_mut().find(|secret| {
            secret.environment_id == write.environment_id && secret.key == write.key
        }) {
            secret.write_value(write.value, write.actor, write.written_at);
            return Ok(secret.clone());
        }

        let secret = Secret::first_version(
            write.project_id,
            write.environment_id,
            write.key,
            write.value,
            write.actor,
            write.written_at,
        );
        secrets.insert(secret.id, secret.clone());
        Ok(secret)
    }

    async fn touch_secret(&self, secret_id: SecretId, at: DateTime<Utc>) -> AppResult<Secret> {
        let mut secrets = self.secrets.write().await;
        let secret = secrets
            .get_mut(&secret_id)
            .ok_or_else(|| AppError::NotFound(format!("secret '{secret_id}' does not exist")))?;

        secret.touch(at);
        Ok(secret.clone())
    }

    async fn delete_secret(&self, secret_id: SecretId) -> AppResult<Secret> {
        self.secrets
            .write()
            .await
            .remove(&secret_id)
            .ok_or_else(|| AppError::NotFound(format!("secret '{secret_id}' does not exist")))
    }
}
