use async_trait::async_trait;
use envkeep_application::{RegistryEntryPatch, RegistryRepository};
use envkeep_core::AppResult;
use envkeep_domain::{ProjectId, RegistryEntry, SecretKey};

use super::InMemoryStore;

#[async_trait]
impl RegistryRepository for InMemoryStore {
    async fn list_entries(&self, project_id: ProjectId) -> AppResult<Vec<RegistryEntry>> {
        let registry = self.registry.read().await;

        let mut values: Vec<RegistryEntry> = registry
            .iter()
            .filter_map(|((stored_project_id, _), entry)| {
                (stored_project_id == &project_id).then_some(entry.clone())
            })
            .collect();
        values.sort_by(|left, right| left.key.cmp(&right.key));

        Ok(values)
    }

    async fn find_entry(
        &self,
        project_id: ProjectId,
        key: &SecretKey,
    ) -> AppResult<Option<RegistryEntry>> {
        Ok(self
            .registry
            .read()
            .await
            .get(&(project_id, key.clone()))
            .cloned())
    }

    async fn upsert_entry(
        &self,
        project_id: ProjectId,
        key: &SecretKey,
        patch: RegistryEntryPatch,
    ) -> AppResult<RegistryEntry> {
        let mut registry = self.registry.write().await;
        let entry = registry
            .entry((project_id, key.clone()))
            .or_insert_with(|| RegistryEntry::described(project_id, key.clone(), ""));

        if let Some(description) = patch.description {
            entry.description = description;
        }
        if let Some(written_at) = patch.last_updated_at {
            entry.record_write(written_at);
        }

        Ok(entry.clone())
    }
}
