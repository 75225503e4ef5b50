//! Auth routes: sign-up, sign-in, sign-out, session lookup.
//!
//! Also home to the request extractors: [`AuthUser`] requires a valid
//! session, [`Member`] additionally requires an onboarded profile.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tenancy::{Profile, SessionInfo, SessionUser, SignInRequest, SignUpRequest};
use time::Duration;

use crate::config::ServerConfig;
use crate::routes::error::{ApiError, ApiResult};
use crate::services::{auth as auth_svc, profile, session};
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";

/// Session token from the `session_token` cookie, else from `Authorization: Bearer`.
pub(crate) fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(COOKIE_NAME).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_owned());
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

fn session_cookie(config: &ServerConfig, token: String) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(Duration::days(config.session_ttl_days))
        .build()
}

fn cleared_cookie(config: &ServerConfig) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(Duration::ZERO)
        .build()
}

// =============================================================================
// EXTRACTORS
// =============================================================================

/// Authenticated user extracted from the session cookie or bearer token.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: SessionUser,
    pub token: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or_else(ApiError::unauthorized)?;

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, &token)
            .await
            .map_err(|e| ApiError::internal("session lookup failed", &e))?
            .ok_or_else(ApiError::unauthorized)?;

        Ok(Self { user, token })
    }
}

/// An authenticated user with a workspace profile. Rejects with 404
/// `profile_missing` for users who have not onboarded.
pub struct Member {
    pub user: SessionUser,
    pub profile: Profile,
}

impl<S> FromRequestParts<S> for Member
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser { user, .. } = AuthUser::from_request_parts(parts, state).await?;
        let app_state = AppState::from_ref(state);
        let profile = profile::require_profile(&app_state.pool, user.id).await?;
        Ok(Self { user, profile })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/auth/signup`: register and start a session.
pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload?;
    state.rate_limiter.check_and_record(&body.email.trim().to_ascii_lowercase())?;
    let user = auth_svc::sign_up(
        &state.pool,
        &body.email,
        &body.password,
        body.domain.as_deref(),
        body.creating_workspace,
    )
    .await?;

    let token = session::create_session(&state.pool, user.id, state.config.session_ttl_days)
        .await
        .map_err(|e| ApiError::internal("session creation failed", &e))?;
    tracing::info!(user_id = %user.id, "user signed up");

    let jar = jar.add(session_cookie(&state.config, token));
    Ok((StatusCode::CREATED, jar, Json(SessionInfo { user })))
}

/// `POST /api/auth/signin`: verify credentials and start a session.
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload?;
    state.rate_limiter.check_and_record(&body.email.trim().to_ascii_lowercase())?;
    let user = auth_svc::sign_in(&state.pool, &body.email, &body.password).await?;

    let token = session::create_session(&state.pool, user.id, state.config.session_ttl_days)
        .await
        .map_err(|e| ApiError::internal("session creation failed", &e))?;
    tracing::info!(user_id = %user.id, "user signed in");

    let jar = jar.add(session_cookie(&state.config, token));
    Ok((jar, Json(SessionInfo { user })))
}

/// `POST /api/auth/signout`: delete session, clear cookie.
pub async fn sign_out(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(e) = session::delete_session(&state.pool, &auth.token).await {
        tracing::warn!(error = %e, user_id = %auth.user.id, "session delete failed");
    }
    let jar = CookieJar::new().add(cleared_cookie(&state.config));
    (jar, StatusCode::NO_CONTENT)
}

/// `GET /api/auth/session`: current user.
pub async fn current_session(auth: AuthUser) -> Json<SessionInfo> {
    Json(SessionInfo { user: auth.user })
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
