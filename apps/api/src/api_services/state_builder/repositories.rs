use std::sync::Arc;

use envkeep_application::{
    AuditRepository, Clock, MemberRepository, ProjectRepository, RegistryRepository,
    SecretRepository, UserDirectory,
};
use envkeep_infrastructure::{
    InMemoryStore, PostgresAuditRepository, PostgresMemberRepository, PostgresProjectRepository,
    PostgresRegistryRepository, PostgresSecretRepository, SystemClock,
};
use sqlx::PgPool;

/// Port implementations the services are assembled from.
#[derive(Clone)]
pub struct RepositorySet {
    pub project_repository: Arc<dyn ProjectRepository>,
    pub secret_repository: Arc<dyn SecretRepository>,
    pub registry_repository: Arc<dyn RegistryRepository>,
    pub audit_repository: Arc<dyn AuditRepository>,
    pub member_repository: Arc<dyn MemberRepository>,
    pub user_directory: Arc<dyn UserDirectory>,
    pub clock: Arc<dyn Clock>,
}

impl RepositorySet {
    pub fn postgres(pool: &PgPool) -> Self {
        let members = Arc::new(PostgresMemberRepository::new(pool.clone()));

        Self {
            project_repository: Arc::new(PostgresProjectRepository::new(pool.clone())),
            secret_repository: Arc::new(PostgresSecretRepository::new(pool.clone())),
            registry_repository: Arc::new(PostgresRegistryRepository::new(pool.clone())),
            audit_repository: Arc::new(PostgresAuditRepository::new(pool.clone())),
            member_repository: members.clone(),
            user_directory: members,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(InMemoryStore::new());

        Self {
            project_repository: store.clone(),
            secret_repository: store.clone(),
            registry_repository: store.clone(),
            audit_repository: store.clone(),
            member_repository: store.clone(),
            user_directory: store,
            clock,
        }
    }
}
