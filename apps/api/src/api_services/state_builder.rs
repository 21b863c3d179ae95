use envkeep_application::{
    AccessService, AuditService, MemberService, ProjectService, PropagationService,
    RegistryService, SearchService, SecretService, SyncService,
};

use crate::state::AppState;

mod repositories;

pub use repositories::RepositorySet;

pub fn build_app_state(
    repositories: RepositorySet,
    auth_proxy_secret: String,
    frontend_url: String,
) -> AppState {
    let access = AccessService::new(
        repositories.project_repository.clone(),
        repositories.member_repository.clone(),
    );
    let audit_service = AuditService::new(
        access.clone(),
        repositories.audit_repository,
        repositories.clock.clone(),
    );
    let registry_service =
        RegistryService::new(access.clone(), repositories.registry_repository);
    let secret_service = SecretService::new(
        access.clone(),
        repositories.secret_repository.clone(),
        registry_service.clone(),
        audit_service.clone(),
        repositories.clock.clone(),
    );

    AppState {
        project_service: ProjectService::new(
            access.clone(),
            repositories.project_repository.clone(),
            audit_service.clone(),
        ),
        sync_service: SyncService::new(
            access.clone(),
            registry_service.clone(),
            repositories.secret_repository.clone(),
        ),
        propagation_service: PropagationService::new(
            access.clone(),
            registry_service.clone(),
            secret_service.clone(),
            repositories.clock.clone(),
        ),
        member_service: MemberService::new(
            access.clone(),
            repositories.project_repository,
            repositories.member_repository,
            repositories.user_directory,
            audit_service.clone(),
            repositories.clock,
        ),
        search_service: SearchService::new(access, repositories.secret_repository),
        secret_service,
        registry_service,
        audit_service,
        auth_proxy_secret,
        frontend_url,
    }
}
