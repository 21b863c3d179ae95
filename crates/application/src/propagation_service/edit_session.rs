use std::collections::BTreeMap;

use envkeep_core::AppResult;
use envkeep_domain::{EnvironmentId, ProjectId, SecretKey};

/// Pending edits against one environment.
///
/// Drafts equal to the stored baseline are dropped as they are staged, so
/// an edit that is reverted by hand leaves nothing to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    project_id: ProjectId,
    environment_id: EnvironmentId,
    stored_values: BTreeMap<SecretKey, String>,
    stored_descriptions: BTreeMap<SecretKey, String>,
    value_drafts: BTreeMap<SecretKey, String>,
    description_drafts: BTreeMap<SecretKey, String>,
}

impl EditSession {
    /// Opens a session over the environment's stored values and the project's descriptions.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        environment_id: EnvironmentId,
        stored_values: BTreeMap<SecretKey, String>,
        stored_descriptions: BTreeMap<SecretKey, String>,
    ) -> Self {
        Self {
            project_id,
            environment_id,
            stored_values,
            stored_descriptions,
            value_drafts: BTreeMap::new(),
            description_drafts: BTreeMap::new(),
        }
    }

    /// Project the session edits.
    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Environment value drafts are committed to.
    #[must_use]
    pub fn environment_id(&self) -> EnvironmentId {
        self.environment_id
    }

    /// Stages a value draft, or drops it when it matches the stored value.
    pub fn stage_value(&mut self, key: &str, value: impl Into<String>) -> AppResult<()> {
        let key = SecretKey::new(key)?;
        let value = value.into();

        if self.stored_values.get(&key) == Some(&value) {
            self.value_drafts.remove(&key);
        } else {
            self.value_drafts.insert(key, value);
        }

        Ok(())
    }

    /// Stages a description draft, or drops it when it matches the registry.
    pub fn stage_description(
        &mut self,
        key: &str,
        description: impl Into<String>,
    ) -> AppResult<()> {
        let key = SecretKey::new(key)?;
        let description = description.into();
        let stored = self
            .stored_descriptions
            .get(&key)
            .map(String::as_str)
            .unwrap_or_default();

        if stored == description {
            self.description_drafts.remove(&key);
        } else {
            self.description_drafts.insert(key, description);
        }

        Ok(())
    }

    /// Pending value drafts ordered by key.
    #[must_use]
    pub fn value_drafts(&self) -> &BTreeMap<SecretKey, String> {
        &self.value_drafts
    }

    /// Pending description drafts ordered by key.
    #[must_use]
    pub fn description_drafts(&self) -> &BTreeMap<SecretKey, String> {
        &self.description_drafts
    }

    /// Returns whether nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value_drafts.is_empty() && self.description_drafts.is_empty()
    }
}
