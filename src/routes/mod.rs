pub mod admin;
pub mod auth;
pub mod projects;
pub mod sessions;

use axum::Router;
use axum::routing::{delete, get, post, put};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        // Projects
        .route("/api/v1/projects", get(projects::list).post(projects::create))
        .route(
            "/api/v1/projects/{id}",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
        // Timer
        .route("/api/v1/projects/{id}/start", post(projects::start_timer))
        .route("/api/v1/projects/{id}/stop", post(projects::stop_timer))
        .route(
            "/api/v1/projects/{id}/reset-week",
            post(projects::reset_week),
        )
        // Sessions
        .route(
            "/api/v1/projects/{id}/sessions",
            get(projects::list_sessions),
        )
        .route(
            "/api/v1/sessions/{id}",
            put(sessions::update).delete(sessions::delete),
        )
        // Admin
        .route("/api/v1/admin/users", get(admin::list_users))
        .route("/api/v1/admin/users/{id}", delete(admin::delete_user))
        .route(
            "/api/v1/admin/users/{id}/projects",
            get(admin::list_user_projects),
        )
}
