//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the JSON API under `/api`, serves stored objects
//! (company logos) read-only under `/storage`, and exposes `/healthz`.
//! CORS is permissive; authenticated calls carry either the session cookie
//! or an `Authorization: Bearer` token.

pub mod auth;
pub mod company;
pub mod error;
pub mod groups;
pub mod invites;
pub mod whiteboards;
pub mod workspace;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::storage::{MAX_LOGO_BYTES, STORAGE_ROUTE};
use crate::state::AppState;

/// JSON API routes.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(auth::sign_up))
        .route("/api/auth/signin", post(auth::sign_in))
        .route("/api/auth/signout", post(auth::sign_out))
        .route("/api/auth/session", get(auth::current_session))
        .route("/api/functions/create-company", post(company::create_company))
        .route("/api/domains/{name}", get(workspace::get_domain))
        .route("/api/domain", patch(workspace::update_domain))
        .route(
            "/api/domain/logo",
            put(workspace::upload_logo).layer(DefaultBodyLimit::max(MAX_LOGO_BYTES)),
        )
        .route("/api/profile", get(workspace::get_profile).patch(workspace::update_profile))
        .route("/api/profiles", get(workspace::list_members))
        .route("/api/profiles/search", get(workspace::search_members))
        .route("/api/whiteboards", get(whiteboards::list).post(whiteboards::create))
        .route(
            "/api/whiteboards/{id}",
            get(whiteboards::get)
                .patch(whiteboards::update)
                .delete(whiteboards::delete),
        )
        .route(
            "/api/whiteboards/{id}/shares",
            get(whiteboards::list_shares).post(whiteboards::upsert_share),
        )
        .route("/api/whiteboards/{id}/shares/{user_id}", delete(whiteboards::remove_share))
        .route(
            "/api/whiteboards/{id}/group-shares",
            get(whiteboards::list_group_shares).post(whiteboards::upsert_group_share),
        )
        .route(
            "/api/whiteboards/{id}/group-shares/{group_id}",
            delete(whiteboards::remove_group_share),
        )
        .route(
            "/api/whiteboards/{id}/invites",
            get(whiteboards::list_invites).post(whiteboards::create_invite),
        )
        .route("/api/whiteboards/{id}/invites/{token}", delete(whiteboards::revoke_invite))
        .route("/api/groups", get(groups::list).post(groups::create))
        .route("/api/groups/{id}", delete(groups::delete))
        .route("/api/groups/{id}/members", get(groups::members).post(groups::add_member))
        .route("/api/groups/{id}/members/{user_id}", delete(groups::remove_member))
        .route("/api/invites/{token}", get(invites::resolve))
        .route("/api/invites/{token}/whiteboard", patch(invites::update_whiteboard))
}

/// The complete application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let storage = ServeDir::new(&state.config.storage_dir);

    api_routes()
        .route("/healthz", get(healthz))
        .nest_service(STORAGE_ROUTE, storage)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
