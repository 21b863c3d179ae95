//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_store;
mod postgres_audit_repository;
mod postgres_member_repository;
mod postgres_project_repository;
mod postgres_registry_repository;
mod postgres_secret_repository;
mod system_clock;

pub use in_memory_store::InMemoryStore;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_member_repository::PostgresMemberRepository;
pub use postgres_project_repository::PostgresProjectRepository;
pub use postgres_registry_repository::PostgresRegistryRepository;
pub use postgres_secret_repository::PostgresSecretRepository;
pub use system_clock::SystemClock;
