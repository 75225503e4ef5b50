//! Whiteboard service: CRUD and effective-access checks.
//!
//! DESIGN
//! ======
//! Access is always computed from rows, never cached: the owner column, the
//! caller's direct share and the shares of every group they belong to are
//! loaded together and folded by [`tenancy::sharing::resolve_access`].
//! Whiteboards outside the caller's domain, or with no access at all, are
//! reported as not found so ids cannot be probed.

use std::collections::HashMap;

use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tenancy::sharing::{Grants, resolve_access};
use tenancy::{
    Access, CreateWhiteboardRequest, MemberSummary, Permission, Profile, UpdateWhiteboardRequest, Whiteboard,
    WhiteboardCard,
};
use uuid::Uuid;

use crate::services::profile::member_from_row;

#[derive(Debug, thiserror::Error)]
pub enum WhiteboardError {
    #[error("Whiteboard not found")]
    NotFound,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Invalid(&'static str),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

pub(crate) const WHITEBOARD_COLUMNS: &str =
    "w.id, w.title, w.description, w.owner_id, w.domain_id, w.data, w.created_at, w.updated_at";

pub(crate) fn whiteboard_from_row(row: &PgRow) -> Result<Whiteboard, sqlx::Error> {
    Ok(Whiteboard {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        owner_id: row.try_get("owner_id")?,
        domain_id: row.try_get("domain_id")?,
        data: row.try_get("data")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Permission column values; the table CHECK keeps unknown strings out.
pub(crate) fn parse_permission(raw: &str) -> Option<Permission> {
    let parsed = Permission::parse(raw);
    if parsed.is_none() {
        tracing::warn!(permission = raw, "ignoring unknown permission value");
    }
    parsed
}

fn grants_from_row(row: &PgRow) -> Result<Grants, sqlx::Error> {
    let direct: Option<String> = row.try_get("direct_permission")?;
    let via_groups: Vec<String> = row.try_get("group_permissions")?;
    Ok(Grants {
        direct: direct.as_deref().and_then(parse_permission),
        via_groups: via_groups.iter().filter_map(|p| parse_permission(p)).collect(),
    })
}

/// Whiteboard columns plus the caller's direct and group grants. `$1` is the
/// caller's domain, `$2` the caller.
const WITH_GRANTS: &str = "
    SELECT w.id, w.title, w.description, w.owner_id, w.domain_id, w.data, w.created_at, w.updated_at,
        (SELECT s.permission FROM whiteboard_shares s
          WHERE s.whiteboard_id = w.id AND s.user_id = $2) AS direct_permission,
        ARRAY(SELECT gws.permission FROM group_whiteboard_shares gws
                JOIN group_members gm ON gm.group_id = gws.group_id
               WHERE gws.whiteboard_id = w.id AND gm.user_id = $2)::text[] AS group_permissions
    FROM whiteboards w
    WHERE w.domain_id = $1";

/// Load a whiteboard and the caller's access to it.
///
/// # Errors
///
/// [`WhiteboardError::NotFound`] when it does not exist in the caller's
/// domain or the caller has no access.
pub async fn load_with_access(
    pool: &PgPool,
    caller: &Profile,
    whiteboard_id: Uuid,
) -> Result<(Whiteboard, Access), WhiteboardError> {
    let row = sqlx::query(&format!("{WITH_GRANTS} AND w.id = $3"))
        .bind(caller.domain_id)
        .bind(caller.id)
        .bind(whiteboard_id)
        .fetch_optional(pool)
        .await?
        .ok_or(WhiteboardError::NotFound)?;

    let whiteboard = whiteboard_from_row(&row)?;
    let access = resolve_access(whiteboard.owner_id, caller.id, &grants_from_row(&row)?);
    if access.can_view() { Ok((whiteboard, access)) } else { Err(WhiteboardError::NotFound) }
}

/// Like [`load_with_access`] but requires at least `required`.
///
/// # Errors
///
/// [`WhiteboardError::Forbidden`] when the caller can see the board but
/// holds less than `required`.
pub async fn require_access(
    pool: &PgPool,
    caller: &Profile,
    whiteboard_id: Uuid,
    required: Permission,
) -> Result<(Whiteboard, Access), WhiteboardError> {
    let (whiteboard, access) = load_with_access(pool, caller, whiteboard_id).await?;
    if access.at_least(required) {
        Ok((whiteboard, access))
    } else {
        Err(WhiteboardError::Forbidden("Insufficient permission for this whiteboard"))
    }
}

/// Like [`load_with_access`] but only the owner passes.
///
/// # Errors
///
/// [`WhiteboardError::Forbidden`] for anyone but the owner.
pub async fn require_owner(pool: &PgPool, caller: &Profile, whiteboard_id: Uuid) -> Result<Whiteboard, WhiteboardError> {
    let (whiteboard, access) = load_with_access(pool, caller, whiteboard_id).await?;
    if access.can_manage() {
        Ok(whiteboard)
    } else {
        Err(WhiteboardError::Forbidden("Only the owner can manage this whiteboard"))
    }
}

/// Every whiteboard the caller can see, most recently updated first.
///
/// # Errors
///
/// Returns a database error if a query fails.
pub async fn list_visible(pool: &PgPool, caller: &Profile) -> Result<Vec<WhiteboardCard>, WhiteboardError> {
    let rows = sqlx::query(&format!(
        "SELECT * FROM ({WITH_GRANTS}) visible
         WHERE owner_id = $2 OR direct_permission IS NOT NULL OR cardinality(group_permissions) > 0
         ORDER BY updated_at DESC"
    ))
    .bind(caller.domain_id)
    .bind(caller.id)
    .fetch_all(pool)
    .await?;

    let mut boards = Vec::with_capacity(rows.len());
    for row in &rows {
        let whiteboard = whiteboard_from_row(row)?;
        let access = resolve_access(whiteboard.owner_id, caller.id, &grants_from_row(row)?);
        boards.push((whiteboard, access));
    }

    let ids: Vec<Uuid> = boards.iter().map(|(w, _)| w.id).collect();
    let owner_ids: Vec<Uuid> = boards.iter().map(|(w, _)| w.owner_id).collect();
    let owners = load_members(pool, &owner_ids).await?;
    let mut collaborators = load_collaborators(pool, &ids).await?;

    Ok(boards
        .into_iter()
        .map(|(whiteboard, access)| WhiteboardCard {
            owner: owners.get(&whiteboard.owner_id).cloned(),
            collaborators: collaborators.remove(&whiteboard.id).unwrap_or_default(),
            access,
            whiteboard,
        })
        .collect())
}

async fn load_members(pool: &PgPool, ids: &[Uuid]) -> Result<HashMap<Uuid, MemberSummary>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query("SELECT id, full_name, email, avatar_url FROM profiles WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;
    rows.iter().map(|row| member_from_row(row).map(|m| (m.id, m))).collect()
}

/// Direct-share recipients per whiteboard, in the order they were added.
async fn load_collaborators(pool: &PgPool, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<MemberSummary>>, sqlx::Error> {
    let mut out: HashMap<Uuid, Vec<MemberSummary>> = HashMap::new();
    if ids.is_empty() {
        return Ok(out);
    }
    let rows = sqlx::query(
        "SELECT s.whiteboard_id, p.id, p.full_name, p.email, p.avatar_url
         FROM whiteboard_shares s JOIN profiles p ON p.id = s.user_id
         WHERE s.whiteboard_id = ANY($1)
         ORDER BY s.created_at ASC",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    for row in &rows {
        let whiteboard_id: Uuid = row.try_get("whiteboard_id")?;
        out.entry(whiteboard_id).or_default().push(member_from_row(row)?);
    }
    Ok(out)
}

fn clean_title(raw: &str) -> Result<&str, WhiteboardError> {
    let title = raw.trim();
    if title.is_empty() { Err(WhiteboardError::Invalid("Title is required")) } else { Ok(title) }
}

/// Create a whiteboard owned by the caller, with empty board data.
///
/// # Errors
///
/// Rejects a blank title; otherwise database errors.
pub async fn create(pool: &PgPool, caller: &Profile, req: &CreateWhiteboardRequest) -> Result<Whiteboard, WhiteboardError> {
    let title = clean_title(&req.title)?;
    let description = req.description.as_deref().map_or("", str::trim);

    let row = sqlx::query(&format!(
        "INSERT INTO whiteboards AS w (title, description, owner_id, domain_id)
         VALUES ($1, $2, $3, $4)
         RETURNING {WHITEBOARD_COLUMNS}"
    ))
    .bind(title)
    .bind(description)
    .bind(caller.id)
    .bind(caller.domain_id)
    .fetch_one(pool)
    .await?;
    let whiteboard = whiteboard_from_row(&row)?;
    tracing::info!(whiteboard_id = %whiteboard.id, owner = %caller.id, "whiteboard created");
    Ok(whiteboard)
}

/// Apply a partial update. Editors and the owner may change anything.
///
/// # Errors
///
/// Not found, forbidden for viewers and commenters, blank title.
pub async fn update(
    pool: &PgPool,
    caller: &Profile,
    whiteboard_id: Uuid,
    req: &UpdateWhiteboardRequest,
) -> Result<Whiteboard, WhiteboardError> {
    let title = req.title.as_deref().map(clean_title).transpose()?;
    require_access(pool, caller, whiteboard_id, Permission::Editor).await?;
    write_fields(pool, whiteboard_id, title, req.description.as_deref().map(str::trim), req.data.as_ref()).await
}

/// Unconditional column update; callers have already authorized it.
pub(crate) async fn write_fields(
    pool: &PgPool,
    whiteboard_id: Uuid,
    title: Option<&str>,
    description: Option<&str>,
    data: Option<&Value>,
) -> Result<Whiteboard, WhiteboardError> {
    let row = sqlx::query(&format!(
        "UPDATE whiteboards AS w SET
             title = COALESCE($2, w.title),
             description = COALESCE($3, w.description),
             data = COALESCE($4, w.data),
             updated_at = now()
         WHERE w.id = $1
         RETURNING {WHITEBOARD_COLUMNS}"
    ))
    .bind(whiteboard_id)
    .bind(title)
    .bind(description)
    .bind(data)
    .fetch_optional(pool)
    .await?
    .ok_or(WhiteboardError::NotFound)?;
    Ok(whiteboard_from_row(&row)?)
}

/// Delete a whiteboard with its shares and invites. Owner only.
///
/// # Errors
///
/// Not found, or forbidden for non-owners.
pub async fn delete(pool: &PgPool, caller: &Profile, whiteboard_id: Uuid) -> Result<(), WhiteboardError> {
    require_owner(pool, caller, whiteboard_id).await?;
    sqlx::query("DELETE FROM whiteboards WHERE id = $1")
        .bind(whiteboard_id)
        .execute(pool)
        .await?;
    tracing::info!(%whiteboard_id, owner = %caller.id, "whiteboard deleted");
    Ok(())
}

#[cfg(test)]
#[path = "whiteboard_test.rs"]
mod tests;
