use async_trait::async_trait;
use envkeep_application::{AuditLogQuery, AuditRepository};
use envkeep_core::AppResult;
use envkeep_domain::AuditLogEntry;

use super::InMemoryStore;

fn matches(entry: &AuditLogEntry, query: &AuditLogQuery) -> bool {
    if entry.project_id != query.project_id {
        return false;
    }
    if let Some(environment_id) = query.environment_id
        && entry.environment_id != Some(environment_id)
    {
        return false;
    }
    if let Some(visible) = &query.visible_environment_ids
        && !entry
            .environment_id
            .is_some_and(|environment_id| visible.contains(&environment_id))
    {
        return false;
    }

    query
        .secret_id
        .is_none_or(|secret_id| entry.secret_id == Some(secret_id))
}

#[async_trait]
impl AuditRepository for InMemoryStore {
    async fn append_entry(&self, entry: AuditLogEntry) -> AppResult<()> {
        self.audit_entries.write().await.push(entry);
        Ok(())
    }

    async fn list_audit_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let entries = self.audit_entries.read().await;

        let mut values: Vec<AuditLogEntry> = entries
            .iter()
            .filter(|entry| matches(entry, &query))
            .cloned()
            .collect();
        // Stable sort keeps append order for equal timestamps.
        values.reverse();
        values.sort_by(|left, right| right.timestamp.cmp(&left.timestamp));

        Ok(values
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }
}
