//! Email and workspace-slug rules.
//!
//! Sign-up is the only place the email domain is checked against the chosen
//! workspace; nothing re-validates it afterwards.

use serde::{Deserialize, Serialize};

/// Keyword the domain entry screen uses for "create a new workspace".
pub const NEW_WORKSPACE_KEYWORD: &str = "new";

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignupError {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("email domain `{email_domain}` does not match workspace `{workspace}`")]
    DomainMismatch { email_domain: String, workspace: String },
    #[error("no workspace selected")]
    NoWorkspace,
}

/// Trim and lowercase an email, requiring exactly one `@` with both sides non-empty.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

/// Domain part of an already-normalized email.
#[must_use]
pub fn email_domain(email: &str) -> Option<&str> {
    email.split_once('@').map(|(_, d)| d).filter(|d| !d.is_empty())
}

/// Local part of an email; used as the default profile name.
#[must_use]
pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or_default()
}

/// Clean a typed workspace name: trimmed, lowercased, whitespace runs become `-`.
#[must_use]
pub fn normalize_domain_slug(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// True when the email's domain part equals the workspace slug (case-insensitive).
#[must_use]
pub fn email_matches_domain(email: &str, domain: &str) -> bool {
    let Some(normalized) = normalize_email(email) else {
        return false;
    };
    email_domain(&normalized).is_some_and(|d| d == normalize_domain_slug(domain))
}

/// The workspace choice made before credentials are entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum DomainSelection {
    Existing(String),
    CreateNew,
}

impl DomainSelection {
    /// Interpret what the user typed on the domain entry screen.
    #[must_use]
    pub fn from_input(raw: &str) -> Option<Self> {
        let slug = normalize_domain_slug(raw);
        if slug.is_empty() {
            None
        } else if slug == NEW_WORKSPACE_KEYWORD {
            Some(Self::CreateNew)
        } else {
            Some(Self::Existing(slug))
        }
    }

    #[must_use]
    pub fn slug(&self) -> Option<&str> {
        match self {
            Self::Existing(slug) => Some(slug),
            Self::CreateNew => None,
        }
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::CreateNew)
    }
}

/// Check a sign-up attempt before anything is sent to the backend.
///
/// # Errors
///
/// Returns the first rule the attempt breaks.
pub fn validate_signup(email: &str, password: &str, selection: &DomainSelection) -> Result<String, SignupError> {
    let normalized = normalize_email(email).ok_or(SignupError::InvalidEmail)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(SignupError::WeakPassword);
    }
    if let DomainSelection::Existing(workspace) = selection {
        let email_domain = email_domain(&normalized).unwrap_or_default();
        if email_domain != workspace.as_str() {
            return Err(SignupError::DomainMismatch {
                email_domain: email_domain.to_owned(),
                workspace: workspace.clone(),
            });
        }
    }
    Ok(normalized)
}

/// Server-side variant taking the wire fields of a sign-up request.
///
/// # Errors
///
/// Returns [`SignupError::NoWorkspace`] when neither a workspace nor the
/// create flag is supplied, otherwise the result of [`validate_signup`].
pub fn validate_signup_request(
    email: &str,
    password: &str,
    domain: Option<&str>,
    creating_workspace: bool,
) -> Result<String, SignupError> {
    let selection = if creating_workspace {
        DomainSelection::CreateNew
    } else {
        domain
            .and_then(DomainSelection::from_input)
            .ok_or(SignupError::NoWorkspace)?
    };
    validate_signup(email, password, &selection)
}

#[cfg(test)]
#[path = "email_test.rs"]
mod tests;
