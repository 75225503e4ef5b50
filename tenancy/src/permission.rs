//! Permission levels and workspace roles.
//!
//! DESIGN
//! ======
//! Permissions are an ordered enum so "highest grant wins" is a plain `max`.
//! Variant order matters: `Viewer < Commenter < Editor`.

use serde::{Deserialize, Serialize};

/// Access level granted on a whiteboard through a share or an invite link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Viewer,
    Commenter,
    Editor,
}

impl Permission {
    pub const ALL: [Self; 3] = [Self::Viewer, Self::Commenter, Self::Editor];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Commenter => "commenter",
            Self::Editor => "editor",
        }
    }

    /// Parse the stored string form. Unknown strings yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "viewer" => Some(Self::Viewer),
            "commenter" => Some(Self::Commenter),
            "editor" => Some(Self::Editor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownPermission(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission `{0}` (expected editor, commenter or viewer)")]
pub struct UnknownPermission(pub String);

/// Role of a profile inside its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            _ => None,
        }
    }

    /// Role assigned to a new profile: the first profile in a domain administers it.
    #[must_use]
    pub fn for_new_profile(is_first_user: bool) -> Self {
        if is_first_user { Self::Admin } else { Self::Member }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Effective access a caller holds on one whiteboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "permission", rename_all = "lowercase")]
pub enum Access {
    /// Owner: full control, including sharing and deletion.
    Owner,
    /// Granted through a direct share, a group share or an invite link.
    Granted(Permission),
    None,
}

impl Access {
    #[must_use]
    pub fn can_view(self) -> bool {
        !matches!(self, Self::None)
    }

    #[must_use]
    pub fn can_comment(self) -> bool {
        self.at_least(Permission::Commenter)
    }

    #[must_use]
    pub fn can_edit(self) -> bool {
        self.at_least(Permission::Editor)
    }

    /// Sharing, invite creation and deletion are owner-only.
    #[must_use]
    pub fn can_manage(self) -> bool {
        matches!(self, Self::Owner)
    }

    #[must_use]
    pub fn at_least(self, required: Permission) -> bool {
        match self {
            Self::Owner => true,
            Self::Granted(p) => p >= required,
            Self::None => false,
        }
    }

    /// Short label for listings: `owner`, the permission name, or `none`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Granted(p) => p.as_str(),
            Self::None => "none",
        }
    }
}

#[cfg(test)]
#[path = "permission_test.rs"]
mod tests;
