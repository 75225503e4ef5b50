//! Public invite routes. The token in the path is the only credential.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use tenancy::{InviteGrant, UpdateInviteWhiteboardRequest, Whiteboard};

use crate::routes::error::ApiResult;
use crate::services::invite;
use crate::state::AppState;

/// `GET /api/invites/{token}`
pub async fn resolve(State(state): State<AppState>, Path(token): Path<String>) -> ApiResult<Json<InviteGrant>> {
    Ok(Json(invite::resolve(&state.pool, &token).await?))
}

/// `PATCH /api/invites/{token}/whiteboard`: editor tokens only.
pub async fn update_whiteboard(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: Result<Json<UpdateInviteWhiteboardRequest>, JsonRejection>,
) -> ApiResult<Json<Whiteboard>> {
    let Json(body) = payload?;
    Ok(Json(invite::update_whiteboard_data(&state.pool, &token, &body.data).await?))
}
