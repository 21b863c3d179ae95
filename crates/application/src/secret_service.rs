use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use envkeep_core::{AppError, AppResult, UserIdentity};
use envkeep_domain::{
    AuditAction, AuditLogEntry, EnvironmentId, ProjectId, Secret, SecretId, SecretKey,
};

use crate::{
    AccessService, AuditEvent, AuditService, Clock, RegistryService, SecretRepository, SecretWrite,
};


/// Application service for per-environment secret values.
#[derive(Clone)]
pub struct SecretService {
    access: AccessService,
    secrets: Arc<dyn SecretRepository>,
    registry: RegistryService,
    audit: AuditService,
    clock: Arc<dyn Clock>,
}

impl SecretService {
    /// Creates a new secret service from required dependencies.
    #[must_use]
    pub fn new(
        access: AccessService,
        secrets: Arc<dyn SecretRepository>,
        registry: RegistryService,
        audit: AuditService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            access,
            secrets,
            registry,
            audit,
            clock,
        }
    }

    /// Writes a value to one environment and advances the key's watermark.
    ///
    /// Once the value write lands it is kept: a failed registry or audit
    /// follow-up is logged and the written secret is still returned.
    pub async fn save_secret(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        environment_id: EnvironmentId,
        key: &str,
        value: &str,
    ) -> AppResult<Secret> {
        self.save_secret_at(actor, project_id, environment_id, key, value, self.clock.now())
            .await
    }

    pub(crate) async fn save_secret_at(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        environment_id: EnvironmentId,
        key: &str,
        value: &str,
        written_at: DateTime<Utc>,
    ) -> AppResult<Secret> {
        let key = SecretKey::new(key)?;
        self.access
            .require_project_environment(actor, project_id, environment_id)
            .await?;

        let secret = self
            .secrets
            .upsert_secret(SecretWrite {
                project_id,
                environment_id,
                key,
                value: value.to_owned(),
                actor: actor.actor_label().to_owned(),
                written_at,
            })
            .await?;

        if let Err(error) = self
            .registry
            .record_write(project_id, &secret.key, written_at)
            .await
        {
            warn!(
                project_id = %project_id,
                key = %secret.key,
                error = %error,
                "secret written but registry watermark was not advanced"
            );
        }

        self.record_best_effort(
            actor,
            AuditEvent {
                project_id,
                environment_id: Some(environment_id),
                secret_id: Some(secret.id),
                action: AuditAction::SecretUpdate,
                description: format!("Updated secret {}", secret.key),
            },
        )
        .await;

        Ok(secret)
    }

    /// Removes one environment's copy of a secret. The registry entry stays.
    pub async fn delete_secret(
        &self,
        actor: &UserIdentity,
        secret_id: SecretId,
    ) -> AppResult<Secret> {
        let secret = self.require_secret(actor, secret_id).await?;
        let deleted = self.secrets.delete_secret(secret.id).await?;

        self.record_best_effort(
            actor,
            AuditEvent {
                project_id: deleted.project_id,
                environment_id: Some(deleted.environment_id),
                secret_id: Some(deleted.id),
                action: AuditAction::SecretDelete,
                description: format!("Deleted secret {}", deleted.key),
            },
        )
        .await;

        Ok(deleted)
    }

    /// Confirms an environment's copy as current without changing value or version.
    pub async fn mark_synced(
        &self,
        actor: &UserIdentity,
        secret_id: SecretId,
    ) -> AppResult<Secret> {
        self.access.require_admin(actor)?;
        let secret = self.require_secret(actor, secret_id).await?;
        let touched = self.secrets.touch_secret(secret.id, self.clock.now()).await?;

        self.record_best_effort(
            actor,
            AuditEvent {
                project_id: touched.project_id,
                environment_id: Some(touched.environment_id),
                secret_id: Some(touched.id),
                action: AuditAction::SecretSync,
                description: format!("Marked secret {} as synced", touched.key),
            },
        )
        .await;

        Ok(touched)
    }

    /// Lists secrets in visible environments, optionally restricted to one.
    pub async fn list_secrets(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        environment_id: Option<EnvironmentId>,
    ) -> AppResult<Vec<Secret>> {
        self.access.require_project_access(actor, project_id).await?;

        if let Some(environment_id) = environment_id {
            self.access
                .require_project_environment(actor, project_id, environment_id)
                .await?;
            return self.secrets.list_secrets(project_id, Some(environment_id)).await;
        }

        let secrets = self.secrets.list_secrets(project_id, None).await?;
        self.retain_visible(actor, project_id, secrets).await
    }

    /// Lists one key's copy in every visible environment.
    pub async fn key_values(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        key: &str,
    ) -> AppResult<Vec<Secret>> {
        let key = SecretKey::new(key)?;
        self.access.require_project_access(actor, project_id).await?;

        let secrets = self.secrets.list_secrets_by_key(project_id, &key).await?;
        self.retain_visible(actor, project_id, secrets).await
    }

    /// Lists audit entries about one secret newest first.
    pub async fn secret_history(
        &self,
        actor: &UserIdentity,
        secret_id: SecretId,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let secret = self.require_secret(actor, secret_id).await?;
        self.audit
            .entries_for_secret(secret.project_id, secret.id)
            .await
    }

    async fn require_secret(&self, actor: &UserIdentity, secret_id: SecretId) -> AppResult<Secret> {
        let secret = self
            .secrets
            .find_secret(secret_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("secret '{secret_id}' does not exist")))?;

        self.access
            .require_environment(actor, secret.environment_id)
            .await?;

        Ok(secret)
    }

    async fn retain_visible(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        secrets: Vec<Secret>,
    ) -> AppResult<Vec<Secret>> {
        let Some(visible) = self.access.visible_environment_ids(actor, project_id).await? else {
            return Ok(secrets);
        };

        Ok(secrets
            .into_iter()
            .filter(|secret| visible.contains(&secret.environment_id))
            .collect())
    }

    async fn record_best_effort(&self, actor: &UserIdentity, event: AuditEvent) {
        let action = event.action;
        let project_id = event.project_id;
        if let Err(error) = self.audit.record(actor, event).await {
            warn!(
                project_id = %project_id,
                action = action.as_str(),
                error = %error,
                "secret change applied but audit entry was not written"
            );
        }
    }
}
