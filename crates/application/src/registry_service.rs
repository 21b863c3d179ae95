use std::sync::Arc;

use chrono::{DateTime, Utc};
use envkeep_core::{AppError, AppResult, UserIdentity};
use envkeep_domain::{ProjectId, RegistryEntry, SecretKey};

use crate::{AccessService, RegistryEntryPatch, RegistryRepository};

/// Maintains the per-project key registry and its watermarks.
#[derive(Clone)]
pub struct RegistryService {
    access: AccessService,
    repository: Arc<dyn RegistryRepository>,
}

impl RegistryService {
    /// Creates a new registry service.
    #[must_use]
    pub fn new(access: AccessService, repository: Arc<dyn RegistryRepository>) -> Self {
        Self { access, repository }
    }

    /// Advances the watermark of `key` to `written_at`, creating the entry when absent.
    ///
    /// The description is left as is and the watermark never moves backwards.
    pub async fn record_write(
        &self,
        project_id: ProjectId,
        key: &SecretKey,
        written_at: DateTime<Utc>,
    ) -> AppResult<RegistryEntry> {
        self.repository
            .upsert_entry(
                project_id,
                key,
                RegistryEntryPatch {
                    description: None,
                    last_updated_at: Some(written_at),
                },
            )
            .await
    }

    /// Replaces the description of `key` without moving its watermark.
    pub async fn update_description(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        key: &str,
        description: &str,
    ) -> AppResult<RegistryEntry> {
        let key = SecretKey::new(key)?;
        self.access.require_project_access(actor, project_id).await?;

        self.repository
            .upsert_entry(
                project_id,
                &key,
                RegistryEntryPatch {
                    description: Some(description.to_owned()),
                    last_updated_at: None,
                },
            )
            .await
    }

    /// Lists a project's registry entries ordered by key.
    pub async fn registry(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
    ) -> AppResult<Vec<RegistryEntry>> {
        self.access.require_project_access(actor, project_id).await?;
        self.repository.list_entries(project_id).await
    }

    pub(crate) async fn entries(&self, project_id: ProjectId) -> AppResult<Vec<RegistryEntry>> {
        self.repository.list_entries(project_id).await
    }

    /// Loads one registry entry the caller can see.
    pub async fn entry(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        key: &str,
    ) -> AppResult<RegistryEntry> {
        let key = SecretKey::new(key)?;
        self.access.require_project_access(actor, project_id).await?;

        self.repository
            .find_entry(project_id, &key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("key '{key}' is not registered")))
    }
}
