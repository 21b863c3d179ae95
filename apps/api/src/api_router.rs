use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use envkeep_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

pub fn build_router(app_state: AppState) -> Result<Router, AppError> {
    let cors_layer = cors::build_cors_layer(app_state.frontend_url.as_str())?;

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::health::me_handler))
        .route(
            "/api/projects",
            get(handlers::projects::list_projects_handler)
                .post(handlers::projects::create_project_handler),
        )
        .route(
            "/api/projects/{project}",
            get(handlers::projects::project_by_slug_handler),
        )
        .route(
            "/api/projects/{project}/environments",
            post(handlers::projects::create_environment_handler),
        )
        .route(
            "/api/environments/{environment_id}",
            delete(handlers::projects::delete_environment_handler),
        )
        .route(
            "/api/projects/{project}/secrets",
            get(handlers::secrets::list_secrets_handler),
        )
        .route(
            "/api/projects/{project}/environments/{environment_id}/secrets/{key}",
            put(handlers::secrets::save_secret_handler),
        )
        .route(
            "/api/secrets/{secret_id}",
            delete(handlers::secrets::delete_secret_handler),
        )
        .route(
            "/api/secrets/{secret_id}/sync",
            post(handlers::secrets::mark_synced_handler),
        )
        .route(
            "/api/secrets/{secret_id}/history",
            get(handlers::secrets::secret_history_handler),
        )
        .route(
            "/api/projects/{project}/registry",
            get(handlers::secrets::registry_handler),
        )
        .route(
            "/api/projects/{project}/registry/{key}/description",
            put(handlers::secrets::update_description_handler),
        )
        .route(
            "/api/projects/{project}/sync-status",
            get(handlers::secrets::sync_status_handler),
        )
        .route(
            "/api/projects/{project}/keys/{key}",
            get(handlers::secrets::key_comparison_handler),
        )
        .route(
            "/api/projects/{project}/environments/{environment_id}/commit",
            post(handlers::propagation::commit_handler),
        )
        .route(
            "/api/projects/{project}/propagate",
            post(handlers::propagation::propagate_handler),
        )
        .route(
            "/api/projects/{project}/members",
            get(handlers::members::list_members_handler)
                .post(handlers::members::add_member_handler),
        )
        .route(
            "/api/projects/{project}/members/{member_id}",
            put(handlers::members::update_member_handler)
                .delete(handlers::members::remove_member_handler),
        )
        .route(
            "/api/projects/{project}/audit-log",
            get(handlers::audit::list_audit_log_handler),
        )
        .route("/api/search", get(handlers::search::search_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_identity,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state))
}
