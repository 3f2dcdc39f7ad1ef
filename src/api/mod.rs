use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod auth;
mod error;
mod members;
mod projects;
mod quiz;
mod ranking;
mod types;

pub use error::ApiError;
pub use types::*;

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let admin_routes = Router::new()
        .route("/admin/project", post(projects::create_project))
        .route("/admin/project/{uuid}", get(projects::get_project))
        .route("/admin/project/{uuid}", put(projects::update_project))
        .route("/admin/project/{uuid}", delete(projects::delete_project))
        .route("/admin/projects", get(projects::list_projects))
        .route("/admin/delete", delete(auth::delete_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let public_routes = Router::new()
        .route("/admin/register", post(auth::register))
        .route("/admin/login", post(auth::login))
        .route("/admin/refresh-token", get(auth::refresh_token))
        .route("/user", post(members::upsert_member))
        .route("/user/project", post(quiz::submit_answers))
        .route("/user/project/{uuid}", get(quiz::get_project))
        .route("/user/projects/all", get(quiz::list_started_projects))
        .route("/user/projects", get(quiz::list_participated))
        .route("/ranking", get(ranking::current_ranking))
        .route("/ranking/all", get(ranking::cumulative_ranking));

    let api_router = Router::new()
        .merge(admin_routes)
        .merge(public_routes)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
