//! Domain (workspace) service: lookup by slug, rename, logo.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tenancy::email::normalize_domain_slug;
use tenancy::{Domain, Profile, Role};
use uuid::Uuid;

use crate::services::storage::{self, ObjectStore, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Domain not found")]
    NotFound,
    #[error("Only workspace admins can change workspace settings")]
    NotAdmin,
    #[error("display_name must not be empty")]
    EmptyDisplayName,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

const DOMAIN_COLUMNS: &str = "id, name, display_name, logo_url, created_at, updated_at";

pub(crate) fn domain_from_row(row: &PgRow) -> Result<Domain, sqlx::Error> {
    Ok(Domain {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        display_name: row.try_get("display_name")?,
        logo_url: row.try_get("logo_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Read a domain from `d_`-prefixed columns of a LEFT JOIN. `None` when the
/// join found no row.
pub(crate) fn domain_from_prefixed_row(row: &PgRow) -> Result<Option<Domain>, sqlx::Error> {
    let Some(id) = row.try_get::<Option<Uuid>, _>("d_id")? else {
        return Ok(None);
    };
    Ok(Some(Domain {
        id,
        name: row.try_get("d_name")?,
        display_name: row.try_get("d_display_name")?,
        logo_url: row.try_get("d_logo_url")?,
        created_at: row.try_get("d_created_at")?,
        updated_at: row.try_get("d_updated_at")?,
    }))
}

/// Look a workspace up by slug. Input is normalized the same way sign-up does.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Domain>, DomainError> {
    let slug = normalize_domain_slug(name);
    if slug.is_empty() {
        return Ok(None);
    }
    let row = sqlx::query(&format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE name = $1"))
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(domain_from_row).transpose()?)
}

fn require_admin(caller: &Profile) -> Result<(), DomainError> {
    if caller.role == Role::Admin { Ok(()) } else { Err(DomainError::NotAdmin) }
}

/// Rename the caller's workspace.
///
/// # Errors
///
/// Non-admin callers get [`DomainError::NotAdmin`].
pub async fn update_display_name(pool: &PgPool, caller: &Profile, display_name: &str) -> Result<Domain, DomainError> {
    require_admin(caller)?;
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(DomainError::EmptyDisplayName);
    }
    let row = sqlx::query(&format!(
        "UPDATE domains SET display_name = $2, updated_at = now() WHERE id = $1 RETURNING {DOMAIN_COLUMNS}"
    ))
    .bind(caller.domain_id)
    .bind(display_name)
    .fetch_optional(pool)
    .await?
    .ok_or(DomainError::NotFound)?;
    tracing::info!(domain_id = %caller.domain_id, "domain renamed");
    Ok(domain_from_row(&row)?)
}

/// Store a new logo and point the workspace at it.
///
/// # Errors
///
/// Non-admins, rejected uploads, storage and database failures.
pub async fn upload_logo(
    pool: &PgPool,
    store: &dyn ObjectStore,
    public_base_url: &str,
    caller: &Profile,
    content_type: &str,
    bytes: &[u8],
) -> Result<Domain, DomainError> {
    require_admin(caller)?;
    let key = storage::logo_key(caller.domain_id, content_type, bytes)?;
    if !store.exists(&key).await? {
        store.put(&key, bytes).await?;
    }
    let url = storage::public_url(public_base_url, &key);

    let row = sqlx::query(&format!(
        "UPDATE domains SET logo_url = $2, updated_at = now() WHERE id = $1 RETURNING {DOMAIN_COLUMNS}"
    ))
    .bind(caller.domain_id)
    .bind(&url)
    .fetch_optional(pool)
    .await?
    .ok_or(DomainError::NotFound)?;
    tracing::info!(domain_id = %caller.domain_id, %key, size = bytes.len(), "domain logo updated");
    Ok(domain_from_row(&row)?)
}

#[cfg(test)]
#[path = "domain_test.rs"]
mod tests;
