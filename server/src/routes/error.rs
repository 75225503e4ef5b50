//! `ApiError`: the single error type every handler returns.
//!
//! Service errors convert into it via `From`, choosing the status code; the
//! body is always `{"error": "...", "code"?: "..."}`. Database and other
//! internal failures are logged here and replaced with a generic message.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tenancy::{ErrorBody, PROFILE_MISSING_CODE};

use crate::rate_limit::RateLimitError;
use crate::services::auth::AuthError;
use crate::services::company::CompanyError;
use crate::services::domain::DomainError;
use crate::services::group::GroupError;
use crate::services::invite::InviteError;
use crate::services::profile::ProfileError;
use crate::services::share::ShareError;
use crate::services::storage::StorageError;
use crate::services::whiteboard::WhiteboardError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: Option<&'static str>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), code: None }
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Not authenticated")
    }

    #[must_use]
    pub fn profile_missing() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: ProfileError::ProfileMissing.to_string(),
            code: Some(PROFILE_MISSING_CODE),
        }
    }

    /// Log the cause and answer with an opaque 500.
    pub fn internal(context: &str, err: &dyn std::fmt::Display) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    fn from_display(status: StatusCode, err: &dyn std::fmt::Display) -> Self {
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.message, code: self.code.map(str::to_owned) };
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signup(_) => Self::from_display(StatusCode::BAD_REQUEST, &err),
            AuthError::AlreadyRegistered => Self::from_display(StatusCode::CONFLICT, &err),
            AuthError::InvalidCredentials => Self::from_display(StatusCode::UNAUTHORIZED, &err),
            AuthError::Hash(_) | AuthError::Db(_) => Self::internal("auth failed", &err),
        }
    }
}

impl From<RateLimitError> for ApiError {
    fn from(err: RateLimitError) -> Self {
        tracing::warn!(error = %err, "auth attempt throttled");
        Self::from_display(StatusCode::TOO_MANY_REQUESTS, &err)
    }
}

impl From<CompanyError> for ApiError {
    fn from(err: CompanyError) -> Self {
        // create-company answers every failure with 400 and the message.
        if let CompanyError::Db(e) = &err {
            tracing::error!(error = %e, "create-company failed");
        }
        Self::from_display(StatusCode::BAD_REQUEST, &err)
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::ProfileMissing => Self::profile_missing(),
            ProfileError::Invalid(_) => Self::from_display(StatusCode::BAD_REQUEST, &err),
            ProfileError::Db(_) => Self::internal("profile query failed", &err),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnsupportedType(_) => Self::from_display(StatusCode::UNSUPPORTED_MEDIA_TYPE, &err),
            StorageError::TooLarge(_) => Self::from_display(StatusCode::PAYLOAD_TOO_LARGE, &err),
            StorageError::Empty | StorageError::InvalidKey(_) => Self::from_display(StatusCode::BAD_REQUEST, &err),
            StorageError::Io(_) => Self::internal("object store failed", &err),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound => Self::from_display(StatusCode::NOT_FOUND, &err),
            DomainError::NotAdmin => Self::from_display(StatusCode::FORBIDDEN, &err),
            DomainError::EmptyDisplayName => Self::from_display(StatusCode::BAD_REQUEST, &err),
            DomainError::Storage(e) => e.into(),
            DomainError::Db(_) => Self::internal("domain query failed", &err),
        }
    }
}

impl From<WhiteboardError> for ApiError {
    fn from(err: WhiteboardError) -> Self {
        match err {
            WhiteboardError::NotFound => Self::from_display(StatusCode::NOT_FOUND, &err),
            WhiteboardError::Forbidden(_) => Self::from_display(StatusCode::FORBIDDEN, &err),
            WhiteboardError::Invalid(_) => Self::from_display(StatusCode::BAD_REQUEST, &err),
            WhiteboardError::Db(_) => Self::internal("whiteboard query failed", &err),
        }
    }
}

impl From<ShareError> for ApiError {
    fn from(err: ShareError) -> Self {
        match err {
            ShareError::Whiteboard(e) => e.into(),
            ShareError::MissingTarget | ShareError::OwnerTarget => Self::from_display(StatusCode::BAD_REQUEST, &err),
            ShareError::UserNotInDomain | ShareError::GroupNotInDomain => {
                Self::from_display(StatusCode::NOT_FOUND, &err)
            }
            ShareError::Db(_) => Self::internal("share query failed", &err),
        }
    }
}

impl From<GroupError> for ApiError {
    fn from(err: GroupError) -> Self {
        match err {
            GroupError::NotFound | GroupError::UserNotInDomain => Self::from_display(StatusCode::NOT_FOUND, &err),
            GroupError::Forbidden => Self::from_display(StatusCode::FORBIDDEN, &err),
            GroupError::EmptyName => Self::from_display(StatusCode::BAD_REQUEST, &err),
            GroupError::AlreadyMember => Self::from_display(StatusCode::CONFLICT, &err),
            GroupError::Db(_) => Self::internal("group query failed", &err),
        }
    }
}

impl From<InviteError> for ApiError {
    fn from(err: InviteError) -> Self {
        match err {
            InviteError::Whiteboard(e) => e.into(),
            InviteError::NotFound => Self::from_display(StatusCode::NOT_FOUND, &err),
            InviteError::Expired => Self::from_display(StatusCode::GONE, &err),
            InviteError::ReadOnly => Self::from_display(StatusCode::FORBIDDEN, &err),
            InviteError::InvalidTtl => Self::from_display(StatusCode::BAD_REQUEST, &err),
            InviteError::Db(_) => Self::internal("invite query failed", &err),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
