//! HTTP surface
//!
//! REST routes under `/api/v1`, the socket endpoint at `/ws` and an
//! unauthenticated `/healthz`.

mod auth;
mod error;
mod issues;
mod notifications;
mod projects;
mod response;
mod tasks;
mod ws;

pub use error::{ApiError, ApiResult};
pub use response::{ApiJson, ApiPath, ApiQuery};

use crate::state::AppState;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

async fn healthz(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "connections": state.rooms.connection_count() }))
}

fn cors(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);
    match HeaderValue::from_str(origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(origin, "invalid CORS origin, cross-origin requests disabled");
            layer
        }
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/google", post(auth::google))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route(
            "/auth/validate-reset-token/:token",
            get(auth::validate_reset_token),
        )
        .route("/auth/getUsers", get(auth::users))
        .route("/project", post(projects::create).get(projects::index))
        .route(
            "/project/:id",
            get(projects::show)
                .patch(projects::update)
                .delete(projects::destroy),
        )
        .route("/project/:id/add-member", post(projects::add_member))
        .route("/project/:id/remove-member", post(projects::remove_member))
        .route("/project/:id/team-members", get(projects::team_members))
        .route("/tasks", post(tasks::create).get(tasks::index))
        .route("/tasks/project/:project_id", get(tasks::by_project))
        .route(
            "/tasks/:id",
            get(tasks::show).patch(tasks::update).delete(tasks::destroy),
        )
        .route("/tasks/:id/assign", patch(tasks::assign))
        .route("/tasks/:id/status", patch(tasks::update_status))
        .route("/issues", post(issues::create).get(issues::index))
        .route(
            "/issues/:id",
            get(issues::show).patch(issues::update).delete(issues::destroy),
        )
        .route("/notifications", get(notifications::index))
        .route(
            "/notifications/:id/mark-as-read",
            patch(notifications::mark_as_read),
        )
        .route(
            "/notifications/:id",
            axum::routing::delete(notifications::destroy),
        )
}

/// Full application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws::upgrade))
        .nest("/api/v1", api_routes())
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(cors(&state.config.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
