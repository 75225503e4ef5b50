//! Group routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use tenancy::{AddGroupMemberRequest, CreateGroupRequest, Group, GroupSummary, MemberSummary};
use uuid::Uuid;

use crate::routes::auth::Member;
use crate::routes::error::ApiResult;
use crate::services::group;
use crate::state::AppState;

/// `GET /api/groups`
pub async fn list(State(state): State<AppState>, member: Member) -> ApiResult<Json<Vec<GroupSummary>>> {
    Ok(Json(group::list(&state.pool, &member.profile).await?))
}

/// `POST /api/groups`
pub async fn create(
    State(state): State<AppState>,
    member: Member,
    payload: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Group>)> {
    let Json(body) = payload?;
    let created = group::create(&state.pool, &member.profile, &body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `DELETE /api/groups/{id}`
pub async fn delete(State(state): State<AppState>, member: Member, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    group::delete(&state.pool, &member.profile, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/groups/{id}/members`
pub async fn members(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberSummary>>> {
    Ok(Json(group::members(&state.pool, &member.profile, id).await?))
}

/// `POST /api/groups/{id}/members`
pub async fn add_member(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<Uuid>,
    payload: Result<Json<AddGroupMemberRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = payload?;
    group::add_member(&state.pool, &member.profile, id, body.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/groups/{id}/members/{user_id}`
pub async fn remove_member(
    State(state): State<AppState>,
    member: Member,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    group::remove_member(&state.pool, &member.profile, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
