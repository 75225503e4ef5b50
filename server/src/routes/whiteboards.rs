//! Whiteboard routes: CRUD, sharing, group sharing and invite management.
//!
//! Every handler runs as a [`Member`]; the services enforce access through
//! the caller's effective permission on the whiteboard.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use tenancy::{
    Access, CreateInviteRequest, CreateWhiteboardRequest, GroupShareEntry, GroupShareRequest, InviteToken, Permission,
    ShareEntry, ShareRequest, UpdateWhiteboardRequest, Whiteboard, WhiteboardCard,
};
use uuid::Uuid;

use crate::routes::auth::Member;
use crate::routes::error::ApiResult;
use crate::services::{invite, share, whiteboard};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WhiteboardResponse {
    #[serde(flatten)]
    pub whiteboard: Whiteboard,
    pub access: Access,
}

#[derive(Debug, Serialize)]
pub struct GroupShareResponse {
    pub group_id: Uuid,
    pub permission: Permission,
}

/// `GET /api/whiteboards`
pub async fn list(State(state): State<AppState>, member: Member) -> ApiResult<Json<Vec<WhiteboardCard>>> {
    Ok(Json(whiteboard::list_visible(&state.pool, &member.profile).await?))
}

/// `POST /api/whiteboards`
pub async fn create(
    State(state): State<AppState>,
    member: Member,
    payload: Result<Json<CreateWhiteboardRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Whiteboard>)> {
    let Json(body) = payload?;
    let created = whiteboard::create(&state.pool, &member.profile, &body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/whiteboards/{id}`
pub async fn get(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WhiteboardResponse>> {
    let (whiteboard, access) = whiteboard::load_with_access(&state.pool, &member.profile, id).await?;
    Ok(Json(WhiteboardResponse { whiteboard, access }))
}

/// `PATCH /api/whiteboards/{id}`: editor or owner.
pub async fn update(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateWhiteboardRequest>, JsonRejection>,
) -> ApiResult<Json<Whiteboard>> {
    let Json(body) = payload?;
    Ok(Json(whiteboard::update(&state.pool, &member.profile, id, &body).await?))
}

/// `DELETE /api/whiteboards/{id}`: owner only, irreversible.
pub async fn delete(State(state): State<AppState>, member: Member, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    whiteboard::delete(&state.pool, &member.profile, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// SHARES
// =============================================================================

/// `GET /api/whiteboards/{id}/shares`
pub async fn list_shares(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ShareEntry>>> {
    Ok(Json(share::list_user_shares(&state.pool, &member.profile, id).await?))
}

/// `POST /api/whiteboards/{id}/shares`
pub async fn upsert_share(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<Uuid>,
    payload: Result<Json<ShareRequest>, JsonRejection>,
) -> ApiResult<Json<ShareEntry>> {
    let Json(body) = payload?;
    Ok(Json(share::share_with_user(&state.pool, &member.profile, id, &body).await?))
}

/// `DELETE /api/whiteboards/{id}/shares/{user_id}`
pub async fn remove_share(
    State(state): State<AppState>,
    member: Member,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    share::unshare_user(&state.pool, &member.profile, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/whiteboards/{id}/group-shares`
pub async fn list_group_shares(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<GroupShareEntry>>> {
    Ok(Json(share::list_group_shares(&state.pool, &member.profile, id).await?))
}

/// `POST /api/whiteboards/{id}/group-shares`
pub async fn upsert_group_share(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<Uuid>,
    payload: Result<Json<GroupShareRequest>, JsonRejection>,
) -> ApiResult<Json<GroupShareResponse>> {
    let Json(body) = payload?;
    let permission = share::share_with_group(&state.pool, &member.profile, id, &body).await?;
    Ok(Json(GroupShareResponse { group_id: body.group_id, permission }))
}

/// `DELETE /api/whiteboards/{id}/group-shares/{group_id}`
pub async fn remove_group_share(
    State(state): State<AppState>,
    member: Member,
    Path((id, group_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    share::unshare_group(&state.pool, &member.profile, id, group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// INVITES (owner side)
// =============================================================================

/// `GET /api/whiteboards/{id}/invites`
pub async fn list_invites(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<InviteToken>>> {
    Ok(Json(invite::list(&state.pool, &member.profile, id).await?))
}

/// `POST /api/whiteboards/{id}/invites`
pub async fn create_invite(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<Uuid>,
    payload: Result<Json<CreateInviteRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InviteToken>)> {
    let Json(body) = payload?;
    let created = invite::create(&state.pool, &member.profile, id, &body, state.config.invite_ttl_hours).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `DELETE /api/whiteboards/{id}/invites/{token}`
pub async fn revoke_invite(
    State(state): State<AppState>,
    member: Member,
    Path((id, token)): Path<(Uuid, String)>,
) -> ApiResult<StatusCode> {
    invite::revoke(&state.pool, &member.profile, id, &token).await?;
    Ok(StatusCode::NO_CONTENT)
}
