mod audit;
mod common;
mod members;
mod projects;
mod propagation;
mod secrets;

pub use audit::{AuditLogEntryResponse, SearchResponse, SecretKeyHitResponse};
pub use common::{HealthResponse, UserIdentityResponse};
pub use members::{AddMemberRequest, MemberResponse, UpdateMemberRequest};
pub use projects::{
    CreateEnvironmentRequest, CreateProjectRequest, EnvironmentResponse, ProjectDetailResponse,
    ProjectResponse,
};
pub use propagation::{
    CommitRequest, CommitResponse, CommittedValueDto, PropagateRequest,
    PropagationFailureResponse, PropagationOfferResponse, PropagationReportResponse,
};
pub use secrets::{
    KeyComparisonResponse, RegistryEntryResponse, SaveSecretRequest, SecretResponse,
    SyncRecordResponse, SyncStatusDto, UpdateDescriptionRequest,
};
