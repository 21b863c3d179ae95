use std::sync::Arc;

use envkeep_core::{AppResult, UserIdentity};
use envkeep_domain::{ProjectId, SyncRecord, evaluate_sync};

use crate::{AccessService, RegistryService, SecretRepository};

/// Reports per-environment sync status for every registered key.
#[derive(Clone)]
pub struct SyncService {
    access: AccessService,
    registry: RegistryService,
    secrets: Arc<dyn SecretRepository>,
}

impl SyncService {
    /// Creates a new sync service.
    #[must_use]
    pub fn new(
        access: AccessService,
        registry: RegistryService,
        secrets: Arc<dyn SecretRepository>,
    ) -> Self {
        Self {
            access,
            registry,
            secrets,
        }
    }

    /// Evaluates the registry against the environments visible to `actor`.
    ///
    /// Reads only; storage failures propagate unchanged.
    pub async fn evaluate(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
    ) -> AppResult<Vec<SyncRecord>> {
        self.access.require_project_access(actor, project_id).await?;

        let environments = self.access.visible_environments(actor, project_id).await?;
        let registry = self.registry.entries(project_id).await?;
        let secrets = self.secrets.list_secrets(project_id, None).await?;

        Ok(evaluate_sync(&environments, &registry, &secrets))
    }
}
