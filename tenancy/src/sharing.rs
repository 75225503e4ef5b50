//! Effective-access resolution for whiteboards.
//!
//! A caller's access is the owner check first, then the highest permission
//! among their direct share and every group share whose group contains them.
//! Conflicting grants resolve to the most privileged one.

use uuid::Uuid;

use crate::permission::{Access, Permission};

/// Every grant that may apply to one (whiteboard, user) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grants {
    /// Permission from a `whiteboard_shares` row for this user.
    pub direct: Option<Permission>,
    /// Permissions from `group_whiteboard_shares` rows of groups the user belongs to.
    pub via_groups: Vec<Permission>,
}

impl Grants {
    #[must_use]
    pub fn direct(permission: Permission) -> Self {
        Self { direct: Some(permission), via_groups: Vec::new() }
    }

    #[must_use]
    pub fn with_group(mut self, permission: Permission) -> Self {
        self.via_groups.push(permission);
        self
    }

    /// Highest permission across all grants, if any.
    #[must_use]
    pub fn highest(&self) -> Option<Permission> {
        self.direct.into_iter().chain(self.via_groups.iter().copied()).max()
    }
}

/// Resolve what `user_id` may do on a whiteboard owned by `owner_id`.
#[must_use]
pub fn resolve_access(owner_id: Uuid, user_id: Uuid, grants: &Grants) -> Access {
    if owner_id == user_id {
        return Access::Owner;
    }
    grants.highest().map_or(Access::None, Access::Granted)
}

/// Combine identity-based access with an invite capability. The invite never
/// lowers what the caller already holds.
#[must_use]
pub fn with_invite(access: Access, invite: Option<Permission>) -> Access {
    match (access, invite) {
        (Access::Owner, _) | (_, None) => access,
        (Access::None, Some(p)) => Access::Granted(p),
        (Access::Granted(held), Some(p)) => Access::Granted(held.max(p)),
    }
}

#[cfg(test)]
#[path = "sharing_test.rs"]
mod tests;
