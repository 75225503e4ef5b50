//! Profile service: lookup, update, member listing and search.
//!
//! Every workspace endpoint starts by resolving the caller's profile: it
//! carries the tenant boundary (`domain_id`) and the caller's role.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tenancy::search::SEARCH_LIMIT;
use tenancy::{MemberSummary, Profile, ProfileWithDomain, Role, UpdateProfileRequest};
use uuid::Uuid;

use crate::services::domain::domain_from_prefixed_row;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Profile not found; complete company setup first")]
    ProfileMissing,
    #[error("{0}")]
    Invalid(&'static str),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

const PROFILE_COLUMNS: &str = "p.id, p.domain_id, p.email, p.full_name, p.avatar_url, p.role, p.created_at, p.updated_at";

pub(crate) fn profile_from_row(row: &PgRow) -> Result<Profile, sqlx::Error> {
    let role: String = row.try_get("role")?;
    Ok(Profile {
        id: row.try_get("id")?,
        domain_id: row.try_get("domain_id")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        avatar_url: row.try_get("avatar_url")?,
        role: Role::parse(&role).unwrap_or(Role::Member),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) fn member_from_row(row: &PgRow) -> Result<MemberSummary, sqlx::Error> {
    Ok(MemberSummary {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        avatar_url: row.try_get("avatar_url")?,
    })
}

/// Load a profile joined with its domain. `Ok(None)` means no profile row.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn fetch_profile_with_domain(pool: &PgPool, user_id: Uuid) -> Result<Option<ProfileWithDomain>, ProfileError> {
    let row = sqlx::query(&format!(
        "SELECT {PROFILE_COLUMNS},
                d.id AS d_id, d.name AS d_name, d.display_name AS d_display_name,
                d.logo_url AS d_logo_url, d.created_at AS d_created_at, d.updated_at AS d_updated_at
         FROM profiles p
         LEFT JOIN domains d ON d.id = p.domain_id
         WHERE p.id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let profile = profile_from_row(&row)?;
    let domain = domain_from_prefixed_row(&row)?;
    if domain.is_none() {
        tracing::warn!(%user_id, domain_id = %profile.domain_id, "profile domain unreadable");
    }
    Ok(Some(ProfileWithDomain { profile, domain }))
}

/// Load the caller's profile, failing when onboarding has not happened.
///
/// # Errors
///
/// Returns [`ProfileError::ProfileMissing`] when the user has no profile.
pub async fn require_profile(pool: &PgPool, user_id: Uuid) -> Result<Profile, ProfileError> {
    let row = sqlx::query(&format!("SELECT {PROFILE_COLUMNS} FROM profiles p WHERE p.id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ProfileError::ProfileMissing)?;
    Ok(profile_from_row(&row)?)
}

/// Update the caller's display name and avatar.
///
/// # Errors
///
/// Rejects an empty name; otherwise database errors.
pub async fn update_profile(pool: &PgPool, user_id: Uuid, req: &UpdateProfileRequest) -> Result<Profile, ProfileError> {
    let full_name = match req.full_name.as_deref().map(str::trim) {
        Some("") => return Err(ProfileError::Invalid("full_name must not be empty")),
        other => other,
    };
    let avatar_url = req.avatar_url.as_deref().map(str::trim);

    let row = sqlx::query(&format!(
        "UPDATE profiles p SET
             full_name = COALESCE($2, p.full_name),
             avatar_url = CASE WHEN $3::text IS NULL THEN p.avatar_url ELSE NULLIF($3, '') END,
             updated_at = now()
         WHERE p.id = $1
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(user_id)
    .bind(full_name)
    .bind(avatar_url)
    .fetch_optional(pool)
    .await?
    .ok_or(ProfileError::ProfileMissing)?;
    Ok(profile_from_row(&row)?)
}

/// Everyone in the domain except `exclude`, alphabetically.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_members(pool: &PgPool, domain_id: Uuid, exclude: Uuid) -> Result<Vec<MemberSummary>, ProfileError> {
    let rows = sqlx::query(
        "SELECT id, full_name, email, avatar_url FROM profiles
         WHERE domain_id = $1 AND id <> $2
         ORDER BY full_name ASC, email ASC",
    )
    .bind(domain_id)
    .bind(exclude)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(member_from_row).collect::<Result<_, _>>()?)
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
#[must_use]
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Members of the caller's domain whose name or email contains `query`.
///
/// The caller and every id in `exclude` are left out; at most
/// [`SEARCH_LIMIT`] rows come back. A blank query returns nothing.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn search_members(
    pool: &PgPool,
    caller: &Profile,
    query: &str,
    exclude: &[Uuid],
) -> Result<Vec<MemberSummary>, ProfileError> {
    let Some(query) = tenancy::search::normalize_query(query) else {
        return Ok(Vec::new());
    };
    let pattern = format!("%{}%", escape_like(query));
    let mut excluded = Vec::with_capacity(exclude.len() + 1);
    excluded.push(caller.id);
    excluded.extend_from_slice(exclude);

    let rows = sqlx::query(
        r"SELECT id, full_name, email, avatar_url FROM profiles
          WHERE domain_id = $1
            AND id <> ALL($2)
            AND (full_name ILIKE $3 ESCAPE '\' OR email ILIKE $3 ESCAPE '\')
          ORDER BY full_name ASC
          LIMIT $4",
    )
    .bind(caller.domain_id)
    .bind(&excluded)
    .bind(pattern)
    .bind(SEARCH_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(member_from_row).collect::<Result<_, _>>()?)
}

/// Resolve a member of `domain_id` by email.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn find_member_by_email(pool: &PgPool, domain_id: Uuid, email: &str) -> Result<Option<Uuid>, ProfileError> {
    let Some(email) = tenancy::email::normalize_email(email) else {
        return Ok(None);
    };
    Ok(
        sqlx::query_scalar("SELECT id FROM profiles WHERE domain_id = $1 AND lower(email) = $2")
            .bind(domain_id)
            .bind(email)
            .fetch_optional(pool)
            .await?,
    )
}

/// Whether `user_id` has a profile in `domain_id`.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn is_member(pool: &PgPool, domain_id: Uuid, user_id: Uuid) -> Result<bool, ProfileError> {
    Ok(
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM profiles WHERE id = $1 AND domain_id = $2)")
            .bind(user_id)
            .bind(domain_id)
            .fetch_one(pool)
            .await?,
    )
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
