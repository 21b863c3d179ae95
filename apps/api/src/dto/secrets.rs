use envkeep_domain::{RegistryEntry, Secret, SyncRecord, SyncStatus};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for a single secret write.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/save-secret-request.ts"
)]
pub struct SaveSecretRequest {
    pub value: String,
}

/// Incoming payload for a registry description edit.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-description-request.ts"
)]
pub struct UpdateDescriptionRequest {
    pub description: String,
}

/// API representation of one environment's copy of a secret.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/secret-response.ts"
)]
pub struct SecretResponse {
    pub id: String,
    pub project_id: String,
    pub environment_id: String,
    pub key: String,
    pub value: String,
    pub version: u32,
    pub updated_at: String,
    pub last_changed_by: String,
}

/// API representation of a registry entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/registry-entry-response.ts"
)]
pub struct RegistryEntryResponse {
    pub key: String,
    pub description: String,
    pub last_updated_at: String,
}

/// One key compared across the caller's environments.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/key-comparison-response.ts"
)]
pub struct KeyComparisonResponse {
    pub entry: RegistryEntryResponse,
    pub values: Vec<SecretResponse>,
}

/// Sync status of one (environment, key) pair.
#[derive(Debug, Clone, Copy, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/sync-status-dto.ts"
)]
pub enum SyncStatusDto {
    Synced,
    Outdated,
    Missing,
}

/// API representation of a sync evaluation record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/sync-record-response.ts"
)]
pub struct SyncRecordResponse {
    pub environment_id: String,
    pub environment_name: String,
    pub key: String,
    pub description: String,
    pub status: SyncStatusDto,
    pub secret_id: Option<String>,
    pub value: Option<String>,
    pub registry_updated_at: String,
    pub environment_updated_at: Option<String>,
}

impl From<Secret> for SecretResponse {
    fn from(value: Secret) -> Self {
        Self {
            id: value.id.to_string(),
            project_id: value.project_id.to_string(),
            environment_id: value.environment_id.to_string(),
            key: value.key.as_str().to_owned(),
            value: value.value,
            version: value.version,
            updated_at: value.updated_at.to_rfc3339(),
            last_changed_by: value.last_changed_by,
        }
    }
}

impl From<RegistryEntry> for RegistryEntryResponse {
    fn from(value: RegistryEntry) -> Self {
        Self {
            key: value.key.as_str().to_owned(),
            description: value.description,
            last_updated_at: value.last_updated_at.to_rfc3339(),
        }
    }
}

impl From<SyncStatus> for SyncStatusDto {
    fn from(value: SyncStatus) -> Self {
        match value {
            SyncStatus::Synced => Self::Synced,
            SyncStatus::Outdated => Self::Outdated,
            SyncStatus::Missing => Self::Missing,
        }
    }
}

impl From<SyncRecord> for SyncRecordResponse {
    fn from(value: SyncRecord) -> Self {
        Self {
            environment_id: value.environment_id.to_string(),
            environment_name: value.environment_name,
            key: value.key.as_str().to_owned(),
            description: value.description,
            status: value.status.into(),
            secret_id: value.secret_id.map(|secret_id| secret_id.to_string()),
            value: value.value,
            registry_updated_at: value.registry_updated_at.to_rfc3339(),
            environment_updated_at: value
                .environment_updated_at
                .map(|updated_at| updated_at.to_rfc3339()),
        }
    }
}
