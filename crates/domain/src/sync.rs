//! Registry-versus-environment reconciliation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Environment, EnvironmentId, RegistryEntry, Secret, SecretId, SecretKey};

/// Sync classification of one environment's copy of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// The copy was written or confirmed at or after the watermark.
    Synced,
    /// The watermark moved past this copy's own timestamp.
    Outdated,
    /// The environment has no copy of the key.
    Missing,
}

impl SyncStatus {
    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "SYNCED",
            Self::Outdated => "OUTDATED",
            Self::Missing => "MISSING",
        }
    }

    /// Classifies a copy against its registry entry.
    ///
    /// Only timestamps are compared. Two environments holding identical
    /// bytes still differ in status when one copy predates the watermark.
    #[must_use]
    pub fn classify(secret: Option<&Secret>, entry: &RegistryEntry) -> Self {
        match secret {
            None => Self::Missing,
            Some(secret) if secret.updated_at < entry.last_updated_at => Self::Outdated,
            Some(_) => Self::Synced,
        }
    }
}

/// Status row for one (environment, key) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    /// Environment evaluated.
    pub environment_id: EnvironmentId,
    /// Environment display name.
    pub environment_name: String,
    /// Key evaluated.
    pub key: SecretKey,
    /// Registry description for the key.
    pub description: String,
    /// Classification.
    pub status: SyncStatus,
    /// Secret id of the environment's copy, if any.
    pub secret_id: Option<SecretId>,
    /// Value of the environment's copy, if any.
    pub value: Option<String>,
    /// Registry watermark.
    pub registry_updated_at: DateTime<Utc>,
    /// The copy's own timestamp, if any.
    pub environment_updated_at: Option<DateTime<Utc>>,
}

/// Classifies every (environment, registry key) pair.
///
/// Rows are ordered by the given environment order, then by key. Secrets for
/// environments or keys outside the inputs are ignored.
#[must_use]
pub fn evaluate_sync(
    environments: &[Environment],
    registry: &[RegistryEntry],
    secrets: &[Secret],
) -> Vec<SyncRecord> {
    let copies: HashMap<(EnvironmentId, &SecretKey), &Secret> = secrets
        .iter()
        .map(|secret| ((secret.environment_id, &secret.key), secret))
        .collect();

    let mut entries: Vec<&RegistryEntry> = registry.iter().collect();
    entries.sort_by(|left, right| left.key.cmp(&right.key));

    let mut records = Vec::with_capacity(environments.len() * entries.len());
    for environment in environments {
        for entry in &entries {
            let secret = copies.get(&(environment.id, &entry.key)).copied();
            records.push(SyncRecord {
                environment_id: environment.id,
                environment_name: environment.name.as_str().to_owned(),
                key: entry.key.clone(),
                description: entry.description.clone(),
                status: SyncStatus::classify(secret, entry),
                secret_id: secret.map(|secret| secret.id),
                value: secret.map(|secret| secret.value.clone()),
                registry_updated_at: entry.last_updated_at,
                environment_updated_at: secret.map(|secret| secret.updated_at),
            });
        }
    }

    records
}
