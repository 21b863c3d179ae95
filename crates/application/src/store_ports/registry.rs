use async_trait::async_trait;
use chrono::{DateTime, Utc};
use envkeep_core::AppResult;
use envkeep_domain::{ProjectId, RegistryEntry, SecretKey};

/// Partial update applied by [`RegistryRepository::upsert_entry`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryEntryPatch {
    /// Replaces the description when set.
    pub description: Option<String>,
    /// Advances the watermark when set. Adapters never move it backwards.
    pub last_updated_at: Option<DateTime<Utc>>,
}

/// Repository port for the per-project key registry.
#[async_trait]
pub trait RegistryRepository: Send + Sync {
    /// Lists a project's registry entries ordered by key.
    async fn list_entries(&self, project_id: ProjectId) -> AppResult<Vec<RegistryEntry>>;

    /// Finds one entry.
    async fn find_entry(
        &self,
        project_id: ProjectId,
        key: &SecretKey,
    ) -> AppResult<Option<RegistryEntry>>;

    /// Creates or patches the entry for (project, key).
    ///
    /// A created entry starts with an empty description and an epoch
    /// watermark before the patch is applied.
    async fn upsert_entry(
        &self,
        project_id: ProjectId,
        key: &SecretKey,
        patch: RegistryEntryPatch,
    ) -> AppResult<RegistryEntry>;
}
