//! Workspace routes: domain lookup, the caller's profile, member search, logo upload.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde::Deserialize;
use tenancy::{Domain, MemberSummary, Profile, ProfileWithDomain, UpdateDomainRequest, UpdateProfileRequest};
use uuid::Uuid;

use crate::routes::auth::{AuthUser, Member};
use crate::routes::error::{ApiError, ApiResult};
use crate::services::{domain, profile};
use crate::state::AppState;

/// `GET /api/domains/{name}`: public lookup used before sign-in.
pub async fn get_domain(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Domain>> {
    domain::find_by_name(&state.pool, &name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Domain not found"))
}

/// `GET /api/profile`: the caller's profile with its domain.
pub async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<ProfileWithDomain>> {
    profile::fetch_profile_with_domain(&state.pool, auth.user.id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::profile_missing)
}

/// `PATCH /api/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<Profile>> {
    let Json(body) = payload?;
    Ok(Json(profile::update_profile(&state.pool, auth.user.id, &body).await?))
}

/// `PATCH /api/domain`: admin only.
pub async fn update_domain(
    State(state): State<AppState>,
    member: Member,
    payload: Result<Json<UpdateDomainRequest>, JsonRejection>,
) -> ApiResult<Json<Domain>> {
    let Json(body) = payload?;
    Ok(Json(domain::update_display_name(&state.pool, &member.profile, &body.display_name).await?))
}

/// `PUT /api/domain/logo`: raw image body, admin only.
pub async fn upload_logo(
    State(state): State<AppState>,
    member: Member,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Domain>> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    let updated = domain::upload_logo(
        &state.pool,
        state.storage.as_ref(),
        &state.config.public_base_url,
        &member.profile,
        content_type,
        &body,
    )
    .await?;
    Ok(Json(updated))
}

/// `GET /api/profiles`: everyone else in the caller's workspace.
pub async fn list_members(State(state): State<AppState>, member: Member) -> ApiResult<Json<Vec<MemberSummary>>> {
    Ok(Json(profile::list_members(&state.pool, member.profile.domain_id, member.profile.id).await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    /// Comma-separated profile ids to leave out.
    #[serde(default)]
    pub exclude: Option<String>,
}

/// Parse the `exclude` list, ignoring blanks and malformed ids.
pub(crate) fn parse_exclude(raw: Option<&str>) -> Vec<Uuid> {
    raw.unwrap_or_default()
        .split(',')
        .filter_map(|id| Uuid::parse_str(id.trim()).ok())
        .collect()
}

/// `GET /api/profiles/search?q=&exclude=`
pub async fn search_members(
    State(state): State<AppState>,
    member: Member,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<MemberSummary>>> {
    let exclude = parse_exclude(query.exclude.as_deref());
    Ok(Json(profile::search_members(&state.pool, &member.profile, &query.q, &exclude).await?))
}

#[cfg(test)]
#[path = "workspace_test.rs"]
mod tests;
