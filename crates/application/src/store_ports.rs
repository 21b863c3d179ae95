mod audit;
mod clock;
mod members;
mod projects;
mod registry;
mod secrets;

pub use audit::{AuditLogQuery, AuditRepository};
pub use clock::Clock;
pub use members::{MemberRepository, UserDirectory};
pub use projects::ProjectRepository;
pub use registry::{RegistryEntryPatch, RegistryRepository};
pub use secrets::{SecretRepository, SecretWrite};
