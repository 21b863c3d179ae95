//! Application services and ports.

#![forbid(unsafe_code)]

mod access_service;
mod audit_service;
mod member_service;
mod project_service;
mod propagation_service;
mod registry_service;
mod search_service;
mod secret_service;
mod store_ports;
mod sync_service;

#[cfg(test)]
mod test_support;

pub use access_service::AccessService;
pub use audit_service::{AuditEvent, AuditService};
pub use member_service::MemberService;
pub use project_service::{CreateEnvironmentInput, ProjectService, ProjectView};
pub use propagation_service::{
    CommitError, CommitOutcome, CommittedValue, EditSession, PropagationFailure,
    PropagationOffer, PropagationReport, PropagationService,
};
pub use registry_service::RegistryService;
pub use search_service::{MIN_SEARCH_QUERY_LEN, SearchResults, SearchService, SecretKeyHit};
pub use secret_service::SecretService;
pub use store_ports::{
    AuditLogQuery, AuditRepository, Clock, MemberRepository, ProjectRepository,
    RegistryEntryPatch, RegistryRepository, SecretRepository, SecretWrite, UserDirectory,
};
pub use sync_service::SyncService;
