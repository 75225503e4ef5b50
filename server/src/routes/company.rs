//! `POST /api/functions/create-company`: onboarding into a workspace.
//!
//! Every failure on this route is a 400 with `{error}`, including bodies
//! that are not JSON and requests without a session.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use tenancy::CreateCompanyResponse;

use crate::routes::auth::AuthUser;
use crate::routes::error::{ApiError, ApiResult};
use crate::services::company::{self, CompanyError};
use crate::state::AppState;

/// Fields are checked before the session so the documented 400 messages
/// come back for malformed requests regardless of who sends them.
pub async fn create_company(
    State(state): State<AppState>,
    auth: Result<AuthUser, ApiError>,
    body: Bytes,
) -> ApiResult<Json<CreateCompanyResponse>> {
    let request = company::parse_request(&body)?;
    let input = company::validate_request(&request)?;
    let auth = auth.map_err(|_| CompanyError::NotAuthenticated)?;
    company::ensure_caller(&input, &auth.user)?;

    let created = company::create_company(&state.pool, &input).await?;
    Ok(Json(created))
}
