//! Invite links: bearer tokens granting a fixed permission on one whiteboard.
//!
//! A token works for whoever holds it until `expires_at`; identity is never
//! consulted. Only the whiteboard owner can mint, list or revoke tokens.

use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tenancy::sharing::with_invite;
use tenancy::{Access, CreateInviteRequest, InviteGrant, InviteToken, Profile, Whiteboard};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::config::MAX_INVITE_TTL_HOURS;
use crate::services::session::generate_token;
use crate::services::whiteboard::{self, WHITEBOARD_COLUMNS, WhiteboardError, parse_permission, whiteboard_from_row};

#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    #[error(transparent)]
    Whiteboard(#[from] WhiteboardError),
    #[error("Invite not found")]
    NotFound,
    #[error("Invite has expired")]
    Expired,
    #[error("Invite does not allow editing")]
    ReadOnly,
    #[error("ttl_hours must be between 1 and {MAX_INVITE_TTL_HOURS}")]
    InvalidTtl,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

const INVITE_COLUMNS: &str = "token, domain_id, whiteboard_id, permission, expires_at, created_by";

/// `None` when the stored permission is unreadable; such a token grants nothing.
fn invite_from_row(row: &PgRow) -> Result<Option<InviteToken>, sqlx::Error> {
    let raw: String = row.try_get("permission")?;
    let Some(permission) = parse_permission(&raw) else {
        return Ok(None);
    };
    Ok(Some(InviteToken {
        token: row.try_get("token")?,
        domain_id: row.try_get("domain_id")?,
        whiteboard_id: row.try_get("whiteboard_id")?,
        permission,
        expires_at: row.try_get("expires_at")?,
        created_by: row.try_get("created_by")?,
    }))
}

/// What the bearer of `invite` may do. Invite routes carry no identity, so
/// the invite is the only grant.
pub(crate) fn invite_access(invite: &InviteToken) -> Access {
    with_invite(Access::None, Some(invite.permission))
}

/// Accept a decoded token only while it is readable and unexpired.
pub(crate) fn usable(invite: Option<InviteToken>, now: OffsetDateTime) -> Result<InviteToken, InviteError> {
    let invite = invite.ok_or(InviteError::NotFound)?;
    if invite.is_expired(now) { Err(InviteError::Expired) } else { Ok(invite) }
}

/// Requested lifetime, or `default_hours` when none was given.
///
/// # Errors
///
/// [`InviteError::InvalidTtl`] for zero or anything above the maximum.
pub fn ttl_hours(requested: Option<u32>, default_hours: u32) -> Result<u32, InviteError> {
    match requested.unwrap_or(default_hours) {
        h @ 1..=MAX_INVITE_TTL_HOURS => Ok(h),
        _ => Err(InviteError::InvalidTtl),
    }
}

/// Mint a token for a whiteboard the caller owns.
///
/// # Errors
///
/// Bad TTL, not found, or forbidden for non-owners.
pub async fn create(
    pool: &PgPool,
    caller: &Profile,
    whiteboard_id: Uuid,
    req: &CreateInviteRequest,
    default_ttl_hours: u32,
) -> Result<InviteToken, InviteError> {
    let hours = ttl_hours(req.ttl_hours, default_ttl_hours)?;
    let board = whiteboard::require_owner(pool, caller, whiteboard_id).await?;
    let expires_at = OffsetDateTime::now_utc() + Duration::hours(i64::from(hours));

    let row = sqlx::query(&format!(
        "INSERT INTO invite_tokens (token, domain_id, whiteboard_id, permission, expires_at, created_by)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {INVITE_COLUMNS}"
    ))
    .bind(generate_token())
    .bind(board.domain_id)
    .bind(board.id)
    .bind(req.permission.as_str())
    .bind(expires_at)
    .bind(caller.id)
    .fetch_one(pool)
    .await?;
    tracing::info!(%whiteboard_id, permission = %req.permission, hours, "invite created");
    invite_from_row(&row)?.ok_or(InviteError::NotFound)
}

/// Unexpired invites for a whiteboard the caller owns, soonest expiry first.
///
/// # Errors
///
/// Not found or forbidden for non-owners.
pub async fn list(pool: &PgPool, caller: &Profile, whiteboard_id: Uuid) -> Result<Vec<InviteToken>, InviteError> {
    whiteboard::require_owner(pool, caller, whiteboard_id).await?;
    let rows = sqlx::query(&format!(
        "SELECT {INVITE_COLUMNS} FROM invite_tokens
         WHERE whiteboard_id = $1 AND expires_at > now()
         ORDER BY expires_at ASC"
    ))
    .bind(whiteboard_id)
    .fetch_all(pool)
    .await?;
    let mut invites = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(invite) = invite_from_row(row)? {
            invites.push(invite);
        }
    }
    Ok(invites)
}

/// Revoke one of the whiteboard's invites.
///
/// # Errors
///
/// [`InviteError::NotFound`] when the token does not belong to this whiteboard.
pub async fn revoke(pool: &PgPool, caller: &Profile, whiteboard_id: Uuid, token: &str) -> Result<(), InviteError> {
    whiteboard::require_owner(pool, caller, whiteboard_id).await?;
    let removed = sqlx::query("DELETE FROM invite_tokens WHERE token = $1 AND whiteboard_id = $2")
        .bind(token)
        .bind(whiteboard_id)
        .execute(pool)
        .await?
        .rows_affected();
    if removed == 0 {
        return Err(InviteError::NotFound);
    }
    tracing::info!(%whiteboard_id, "invite revoked");
    Ok(())
}

/// Look up a token and reject it once `now` reaches its expiry.
///
/// # Errors
///
/// [`InviteError::NotFound`] (also for unreadable tokens) or [`InviteError::Expired`].
pub async fn find_active(pool: &PgPool, token: &str, now: OffsetDateTime) -> Result<InviteToken, InviteError> {
    let row = sqlx::query(&format!("SELECT {INVITE_COLUMNS} FROM invite_tokens WHERE token = $1"))
        .bind(token)
        .fetch_optional(pool)
        .await?
        .ok_or(InviteError::NotFound)?;
    usable(invite_from_row(&row)?, now)
}

async fn load_whiteboard(pool: &PgPool, whiteboard_id: Uuid) -> Result<Whiteboard, InviteError> {
    let row = sqlx::query(&format!("SELECT {WHITEBOARD_COLUMNS} FROM whiteboards w WHERE w.id = $1"))
        .bind(whiteboard_id)
        .fetch_optional(pool)
        .await?
        .ok_or(InviteError::NotFound)?;
    Ok(whiteboard_from_row(&row)?)
}

/// The whiteboard and permission an invite grants.
///
/// # Errors
///
/// Unknown or expired token.
pub async fn resolve(pool: &PgPool, token: &str) -> Result<InviteGrant, InviteError> {
    let invite = find_active(pool, token, OffsetDateTime::now_utc()).await?;
    let whiteboard = load_whiteboard(pool, invite.whiteboard_id).await?;
    Ok(InviteGrant { whiteboard, permission: invite.permission, expires_at: invite.expires_at })
}

/// Replace the board data through an editor invite.
///
/// # Errors
///
/// Unknown or expired token, or [`InviteError::ReadOnly`] below editor.
pub async fn update_whiteboard_data(pool: &PgPool, token: &str, data: &Value) -> Result<Whiteboard, InviteError> {
    let invite = find_active(pool, token, OffsetDateTime::now_utc()).await?;
    if !invite_access(&invite).can_edit() {
        return Err(InviteError::ReadOnly);
    }
    let whiteboard = whiteboard::write_fields(pool, invite.whiteboard_id, None, None, Some(data)).await?;
    tracing::info!(whiteboard_id = %whiteboard.id, "whiteboard updated through invite");
    Ok(whiteboard)
}

#[cfg(test)]
#[path = "invite_test.rs"]
mod tests;
