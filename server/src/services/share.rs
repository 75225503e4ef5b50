//! Whiteboard sharing: direct user shares and group shares.
//!
//! Listing needs view access; every mutation needs ownership. Targets must
//! live in the whiteboard's domain. Re-sharing with someone already on the
//! list replaces their permission.

use sqlx::{PgPool, Row};
use tenancy::{GroupShareEntry, GroupShareRequest, Permission, Profile, ShareEntry, ShareRequest};
use uuid::Uuid;

use crate::services::profile::{self, ProfileError};
use crate::services::whiteboard::{self, WhiteboardError, parse_permission};

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error(transparent)]
    Whiteboard(#[from] WhiteboardError),
    #[error("Provide either user_id or email")]
    MissingTarget,
    #[error("User is not a member of this workspace")]
    UserNotInDomain,
    #[error("Group not found in this workspace")]
    GroupNotInDomain,
    #[error("The owner already has full access")]
    OwnerTarget,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl From<ProfileError> for ShareError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Db(e) => Self::Db(e),
            ProfileError::ProfileMissing | ProfileError::Invalid(_) => Self::UserNotInDomain,
        }
    }
}

// =============================================================================
// USER SHARES
// =============================================================================

/// People the whiteboard is shared with directly.
///
/// # Errors
///
/// Not found when the caller cannot see the whiteboard.
pub async fn list_user_shares(pool: &PgPool, caller: &Profile, whiteboard_id: Uuid) -> Result<Vec<ShareEntry>, ShareError> {
    whiteboard::load_with_access(pool, caller, whiteboard_id).await?;
    let rows = sqlx::query(
        "SELECT s.user_id, s.permission, p.full_name, p.email
         FROM whiteboard_shares s JOIN profiles p ON p.id = s.user_id
         WHERE s.whiteboard_id = $1
         ORDER BY s.created_at ASC",
    )
    .bind(whiteboard_id)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        let raw: String = row.try_get("permission")?;
        let Some(permission) = parse_permission(&raw) else { continue };
        out.push(ShareEntry {
            user_id: row.try_get("user_id")?,
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            permission,
        });
    }
    Ok(out)
}

async fn resolve_target(pool: &PgPool, domain_id: Uuid, req: &ShareRequest) -> Result<Uuid, ShareError> {
    match (req.user_id, req.email.as_deref()) {
        (Some(user_id), _) => {
            if profile::is_member(pool, domain_id, user_id).await? {
                Ok(user_id)
            } else {
                Err(ShareError::UserNotInDomain)
            }
        }
        (None, Some(email)) => profile::find_member_by_email(pool, domain_id, email)
            .await?
            .ok_or(ShareError::UserNotInDomain),
        (None, None) => Err(ShareError::MissingTarget),
    }
}

/// Grant or change a member's permission on a whiteboard.
///
/// # Errors
///
/// Forbidden for non-owners; target outside the workspace; owner as target.
pub async fn share_with_user(
    pool: &PgPool,
    caller: &Profile,
    whiteboard_id: Uuid,
    req: &ShareRequest,
) -> Result<ShareEntry, ShareError> {
    if req.user_id.is_none() && req.email.as_deref().is_none_or(|e| e.trim().is_empty()) {
        return Err(ShareError::MissingTarget);
    }
    let board = whiteboard::require_owner(pool, caller, whiteboard_id).await?;
    let user_id = resolve_target(pool, board.domain_id, req).await?;
    if user_id == board.owner_id {
        return Err(ShareError::OwnerTarget);
    }

    sqlx::query(
        "INSERT INTO whiteboard_shares (whiteboard_id, user_id, permission)
         VALUES ($1, $2, $3)
         ON CONFLICT (whiteboard_id, user_id) DO UPDATE SET permission = EXCLUDED.permission",
    )
    .bind(whiteboard_id)
    .bind(user_id)
    .bind(req.permission.as_str())
    .execute(pool)
    .await?;
    tracing::info!(%whiteboard_id, %user_id, permission = %req.permission, "whiteboard shared");

    let row = sqlx::query("SELECT full_name, email FROM profiles WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(ShareEntry {
        user_id,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        permission: req.permission,
    })
}

/// Revoke a member's direct share. Removing a share that does not exist is a no-op.
///
/// # Errors
///
/// Forbidden for non-owners.
pub async fn unshare_user(pool: &PgPool, caller: &Profile, whiteboard_id: Uuid, user_id: Uuid) -> Result<(), ShareError> {
    whiteboard::require_owner(pool, caller, whiteboard_id).await?;
    let removed = sqlx::query("DELETE FROM whiteboard_shares WHERE whiteboard_id = $1 AND user_id = $2")
        .bind(whiteboard_id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();
    tracing::info!(%whiteboard_id, %user_id, removed, "whiteboard unshared");
    Ok(())
}

// =============================================================================
// GROUP SHARES
// =============================================================================

/// Groups the whiteboard is shared with, with their sizes.
///
/// # Errors
///
/// Not found when the caller cannot see the whiteboard.
pub async fn list_group_shares(
    pool: &PgPool,
    caller: &Profile,
    whiteboard_id: Uuid,
) -> Result<Vec<GroupShareEntry>, ShareError> {
    whiteboard::load_with_access(pool, caller, whiteboard_id).await?;
    let rows = sqlx::query(
        "SELECT gws.group_id, gws.permission, g.name,
                (SELECT COUNT(*) FROM group_members gm WHERE gm.group_id = g.id) AS member_count
         FROM group_whiteboard_shares gws JOIN groups g ON g.id = gws.group_id
         WHERE gws.whiteboard_id = $1
         ORDER BY g.name ASC",
    )
    .bind(whiteboard_id)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        let raw: String = row.try_get("permission")?;
        let Some(permission) = parse_permission(&raw) else { continue };
        out.push(GroupShareEntry {
            group_id: row.try_get("group_id")?,
            name: row.try_get("name")?,
            member_count: row.try_get("member_count")?,
            permission,
        });
    }
    Ok(out)
}

/// Grant or change a group's permission on a whiteboard.
///
/// # Errors
///
/// Forbidden for non-owners; group outside the workspace.
pub async fn share_with_group(
    pool: &PgPool,
    caller: &Profile,
    whiteboard_id: Uuid,
    req: &GroupShareRequest,
) -> Result<Permission, ShareError> {
    let board = whiteboard::require_owner(pool, caller, whiteboard_id).await?;
    let in_domain: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM groups WHERE id = $1 AND domain_id = $2)")
        .bind(req.group_id)
        .bind(board.domain_id)
        .fetch_one(pool)
        .await?;
    if !in_domain {
        return Err(ShareError::GroupNotInDomain);
    }

    sqlx::query(
        "INSERT INTO group_whiteboard_shares (whiteboard_id, group_id, permission)
         VALUES ($1, $2, $3)
         ON CONFLICT (whiteboard_id, group_id) DO UPDATE SET permission = EXCLUDED.permission",
    )
    .bind(whiteboard_id)
    .bind(req.group_id)
    .bind(req.permission.as_str())
    .execute(pool)
    .await?;
    tracing::info!(%whiteboard_id, group_id = %req.group_id, permission = %req.permission, "whiteboard shared with group");
    Ok(req.permission)
}

/// Revoke a group share. No-op when absent.
///
/// # Errors
///
/// Forbidden for non-owners.
pub async fn unshare_group(pool: &PgPool, caller: &Profile, whiteboard_id: Uuid, group_id: Uuid) -> Result<(), ShareError> {
    whiteboard::require_owner(pool, caller, whiteboard_id).await?;
    sqlx::query("DELETE FROM group_whiteboard_shares WHERE whiteboard_id = $1 AND group_id = $2")
        .bind(whiteboard_id)
        .bind(group_id)
        .execute(pool)
        .await?;
    tracing::info!(%whiteboard_id, %group_id, "whiteboard unshared from group");
    Ok(())
}

#[cfg(test)]
#[path = "share_test.rs"]
mod tests;
