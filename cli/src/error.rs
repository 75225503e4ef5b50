use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("not signed in; run `boardspace signin` first")]
    NotSignedIn,
    #[error("no workspace selected; run `boardspace domain select <name>` or `boardspace domain new`")]
    NoWorkspaceSelected,
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Signup(#[from] tenancy::email::SignupError),
    #[error("{message} (HTTP {})", .status.as_u16())]
    Api { status: StatusCode, message: String, code: Option<String> },
    #[error("server did not return a session token")]
    MissingSessionToken,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("state file error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Whether the server rejected the request for lack of a valid session.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }

    /// Whether the server reported a missing profile.
    #[must_use]
    pub fn is_profile_missing(&self) -> bool {
        matches!(self, Self::Api { code: Some(code), .. } if code == tenancy::PROFILE_MISSING_CODE)
    }
}
