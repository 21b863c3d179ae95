//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod ids;
mod member;
mod project;
mod registry;
mod secret;
mod sync;

pub use audit::{AuditAction, AuditLogEntry};
pub use ids::{AuditEntryId, EnvironmentId, MemberId, ProjectId, RegistryEntryId, SecretId};
pub use member::{EmailAddress, MemberStatus, ProjectMember};
pub use project::{Environment, Project, Slug};
pub use registry::RegistryEntry;
pub use secret::{Secret, SecretKey};
pub use sync::{SyncRecord, SyncStatus, evaluate_sync};
