use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ProjectId, RegistryEntryId, SecretKey};

/// Project-wide canonical record for one secret key.
///
/// `last_updated_at` is the watermark: the last time any environment wrote
/// the key's value. It is independent of which environment holds the newest
/// value and is never moved by description edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Stable registry entry id.
    pub id: RegistryEntryId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Secret key.
    pub key: SecretKey,
    /// Description shared by every environment.
    pub description: String,
    /// Value-write watermark.
    pub last_updated_at: DateTime<Utc>,
}

impl RegistryEntry {
    /// Creates the entry for a key's first value write.
    #[must_use]
    pub fn first_write(project_id: ProjectId, key: SecretKey, now: DateTime<Utc>) -> Self {
        Self {
            id: RegistryEntryId::new(),
            project_id,
            key,
            description: String::new(),
            last_updated_at: now,
        }
    }

    /// Creates an entry from a description edit that precedes any value write.
    ///
    /// The watermark starts at the epoch so the edit cannot make any
    /// environment look outdated.
    #[must_use]
    pub fn described(
        project_id: ProjectId,
        key: SecretKey,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: RegistryEntryId::new(),
            project_id,
            key,
            description: description.into(),
            last_updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Advances the watermark for a value write. Never moves it backwards.
    pub fn record_write(&mut self, now: DateTime<Utc>) {
        if now > self.last_updated_at {
            self.last_updated_at = now;
        }
    }
}
