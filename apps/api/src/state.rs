use envkeep_application::{
    AuditService, MemberService, ProjectService, PropagationService, RegistryService,
    SearchService, SecretService, SyncService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub project_service: ProjectService,
    pub secret_service: SecretService,
    pub registry_service: RegistryService,
    pub sync_service: SyncService,
    pub propagation_service: PropagationService,
    pub member_service: MemberService,
    pub audit_service: AuditService,
    pub search_service: SearchService,
    pub auth_proxy_secret: String,
    pub frontend_url: String,
}
