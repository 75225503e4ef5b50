//! Groups: named sets of workspace members that whiteboards can be shared with.
//!
//! Anyone in the workspace may create a group and read groups. Changing or
//! deleting one is limited to its creator and workspace admins.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tenancy::{CreateGroupRequest, Group, GroupSummary, MemberSummary, Profile, Role};
use uuid::Uuid;

use crate::services::company::is_unique_violation;
use crate::services::profile::{self, ProfileError, member_from_row};

#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("Group not found")]
    NotFound,
    #[error("Only the group creator or a workspace admin can change this group")]
    Forbidden,
    #[error("Group name is required")]
    EmptyName,
    #[error("User is not a member of this workspace")]
    UserNotInDomain,
    #[error("User is already in this group")]
    AlreadyMember,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl From<ProfileError> for GroupError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Db(e) => Self::Db(e),
            ProfileError::ProfileMissing | ProfileError::Invalid(_) => Self::UserNotInDomain,
        }
    }
}

const GROUP_COLUMNS: &str = "g.id, g.name, g.description, g.domain_id, g.created_by, g.created_at, g.updated_at";

fn group_from_row(row: &PgRow) -> Result<Group, sqlx::Error> {
    Ok(Group {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        domain_id: row.try_get("domain_id")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Whether `caller` may modify `group`.
#[must_use]
pub fn can_manage(caller: &Profile, group: &Group) -> bool {
    group.domain_id == caller.domain_id && (group.created_by == caller.id || caller.role == Role::Admin)
}

/// # Errors
///
/// Rejects a blank name; otherwise database errors.
pub async fn create(pool: &PgPool, caller: &Profile, req: &CreateGroupRequest) -> Result<Group, GroupError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(GroupError::EmptyName);
    }
    let description = req.description.as_deref().map_or("", str::trim);
    let row = sqlx::query(&format!(
        "INSERT INTO groups AS g (name, description, domain_id, created_by)
         VALUES ($1, $2, $3, $4)
         RETURNING {GROUP_COLUMNS}"
    ))
    .bind(name)
    .bind(description)
    .bind(caller.domain_id)
    .bind(caller.id)
    .fetch_one(pool)
    .await?;
    let group = group_from_row(&row)?;
    tracing::info!(group_id = %group.id, domain_id = %caller.domain_id, "group created");
    Ok(group)
}

/// Groups in the caller's workspace, newest first, with member counts.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list(pool: &PgPool, caller: &Profile) -> Result<Vec<GroupSummary>, GroupError> {
    let rows = sqlx::query(&format!(
        "SELECT {GROUP_COLUMNS},
                (SELECT COUNT(*) FROM group_members gm WHERE gm.group_id = g.id) AS member_count
         FROM groups g
         WHERE g.domain_id = $1
         ORDER BY g.created_at DESC"
    ))
    .bind(caller.domain_id)
    .fetch_all(pool)
    .await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        out.push(GroupSummary { group: group_from_row(row)?, member_count: row.try_get("member_count")? });
    }
    Ok(out)
}

/// A group in the caller's workspace.
///
/// # Errors
///
/// [`GroupError::NotFound`] for unknown ids and groups of other workspaces.
pub async fn get(pool: &PgPool, caller: &Profile, group_id: Uuid) -> Result<Group, GroupError> {
    let row = sqlx::query(&format!("SELECT {GROUP_COLUMNS} FROM groups g WHERE g.id = $1 AND g.domain_id = $2"))
        .bind(group_id)
        .bind(caller.domain_id)
        .fetch_optional(pool)
        .await?
        .ok_or(GroupError::NotFound)?;
    Ok(group_from_row(&row)?)
}

async fn get_managed(pool: &PgPool, caller: &Profile, group_id: Uuid) -> Result<Group, GroupError> {
    let group = get(pool, caller, group_id).await?;
    if can_manage(caller, &group) { Ok(group) } else { Err(GroupError::Forbidden) }
}

/// # Errors
///
/// Not found when the group is outside the caller's workspace.
pub async fn members(pool: &PgPool, caller: &Profile, group_id: Uuid) -> Result<Vec<MemberSummary>, GroupError> {
    get(pool, caller, group_id).await?;
    let rows = sqlx::query(
        "SELECT p.id, p.full_name, p.email, p.avatar_url
         FROM group_members gm JOIN profiles p ON p.id = gm.user_id
         WHERE gm.group_id = $1
         ORDER BY p.full_name ASC",
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(member_from_row).collect::<Result<_, _>>()?)
}

/// # Errors
///
/// Forbidden, target outside the workspace, or already a member.
pub async fn add_member(pool: &PgPool, caller: &Profile, group_id: Uuid, user_id: Uuid) -> Result<(), GroupError> {
    let group = get_managed(pool, caller, group_id).await?;
    if !profile::is_member(pool, group.domain_id, user_id).await? {
        return Err(GroupError::UserNotInDomain);
    }
    let inserted = sqlx::query("INSERT INTO group_members (group_id, user_id) VALUES ($1, $2)")
        .bind(group_id)
        .bind(user_id)
        .execute(pool)
        .await;
    match inserted {
        Ok(_) => {
            tracing::info!(%group_id, %user_id, "group member added");
            Ok(())
        }
        Err(e) if is_unique_violation(&e) => Err(GroupError::AlreadyMember),
        Err(e) => Err(e.into()),
    }
}

/// Remove a member. No-op when they were not in the group.
///
/// # Errors
///
/// Forbidden for callers who cannot manage the group.
pub async fn remove_member(pool: &PgPool, caller: &Profile, group_id: Uuid, user_id: Uuid) -> Result<(), GroupError> {
    get_managed(pool, caller, group_id).await?;
    sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
        .bind(group_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    tracing::info!(%group_id, %user_id, "group member removed");
    Ok(())
}

/// Delete a group along with its memberships and whiteboard shares.
///
/// # Errors
///
/// Forbidden for callers who cannot manage the group.
pub async fn delete(pool: &PgPool, caller: &Profile, group_id: Uuid) -> Result<(), GroupError> {
    get_managed(pool, caller, group_id).await?;
    sqlx::query("DELETE FROM groups WHERE id = $1")
        .bind(group_id)
        .execute(pool)
        .await?;
    tracing::info!(%group_id, "group deleted");
    Ok(())
}

#[cfg(test)]
#[path = "group_test.rs"]
mod tests;
