use std::collections::BTreeMap;

use envkeep_application::{
    CommitOutcome, CommittedValue, PropagationFailure, PropagationOffer, PropagationReport,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::projects::EnvironmentResponse;
use super::secrets::{RegistryEntryResponse, SecretResponse};

/// Incoming payload for committing an environment's staged drafts.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/commit-request.ts"
)]
pub struct CommitRequest {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,
}

/// A committed key/value pair offered for propagation.
#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/committed-value-dto.ts"
)]
pub struct CommittedValueDto {
    pub key: String,
    pub value: String,
}

/// Offer to copy committed values into other environments.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/propagation-offer-response.ts"
)]
pub struct PropagationOfferResponse {
    pub source_environment_id: String,
    pub targets: Vec<EnvironmentResponse>,
    pub values: Vec<CommittedValueDto>,
}

/// Result of a commit.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/commit-response.ts"
)]
pub struct CommitResponse {
    pub committed: Vec<SecretResponse>,
    pub described: Vec<RegistryEntryResponse>,
    pub offer: Option<PropagationOfferResponse>,
}

/// Incoming payload for executing a propagation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/propagate-request.ts"
)]
pub struct PropagateRequest {
    pub source_environment_id: String,
    pub values: Vec<CommittedValueDto>,
    pub target_environment_ids: Vec<String>,
}

/// One failed (target, key) write.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/propagation-failure-response.ts"
)]
pub struct PropagationFailureResponse {
    pub environment_id: String,
    pub key: String,
    pub message: String,
}

/// Per-target outcome of a propagation.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/propagation-report-response.ts"
)]
pub struct PropagationReportResponse {
    pub complete: bool,
    pub succeeded_targets: Vec<String>,
    pub failed_targets: Vec<String>,
    pub applied: Vec<SecretResponse>,
    pub failures: Vec<PropagationFailureResponse>,
}

impl From<CommittedValue> for CommittedValueDto {
    fn from(value: CommittedValue) -> Self {
        Self {
            key: value.key.as_str().to_owned(),
            value: value.value,
        }
    }
}

impl From<PropagationOffer> for PropagationOfferResponse {
    fn from(value: PropagationOffer) -> Self {
        Self {
            source_environment_id: value.source_environment_id.to_string(),
            targets: value
                .targets
                .into_iter()
                .map(EnvironmentResponse::from)
                .collect(),
            values: value
                .values
                .into_iter()
                .map(CommittedValueDto::from)
                .collect(),
        }
    }
}

impl From<CommitOutcome> for CommitResponse {
    fn from(value: CommitOutcome) -> Self {
        Self {
            committed: value
                .committed
                .into_iter()
                .map(SecretResponse::from)
                .collect(),
            described: value
                .described
                .into_iter()
                .map(RegistryEntryResponse::from)
                .collect(),
            offer: value.offer.map(PropagationOfferResponse::from),
        }
    }
}

impl From<PropagationFailure> for PropagationFailureResponse {
    fn from(value: PropagationFailure) -> Self {
        Self {
            environment_id: value.environment_id.to_string(),
            key: value.key.as_str().to_owned(),
            message: value.error.to_string(),
        }
    }
}

impl From<PropagationReport> for PropagationReportResponse {
    fn from(value: PropagationReport) -> Self {
        Self {
            complete: value.is_complete(),
            succeeded_targets: value
                .succeeded_targets()
                .into_iter()
                .map(|environment_id| environment_id.to_string())
                .collect(),
            failed_targets: value
                .failed_targets()
                .into_iter()
                .map(|environment_id| environment_id.to_string())
                .collect(),
            applied: value.applied.into_iter().map(SecretResponse::from).collect(),
            failures: value
                .failures
                .into_iter()
                .map(PropagationFailureResponse::from)
                .collect(),
        }
    }
}
