//! `create-company`: the one server-authoritative onboarding rule.
//!
//! DESIGN
//! ======
//! Given `{domain, displayName, userEmail, userId}`:
//! 1. every field must be present,
//! 2. the email's domain part must equal `domain`,
//! 3. the domain is reused by name or created with `displayName`,
//! 4. the caller's profile is inserted, as `admin` when the domain had no
//!    profiles yet and `member` otherwise.
//!
//! All of it runs in one transaction with the domain row locked, so two
//! people onboarding the same company concurrently cannot both become admin.

use sqlx::{PgPool, Postgres, Row, Transaction};
use tenancy::email::{email_domain, email_local_part, normalize_domain_slug, normalize_email};
use tenancy::{CreateCompanyRequest, CreateCompanyResponse, Role, SessionUser};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CompanyError {
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Missing required fields")]
    MissingFields,
    #[error("Invalid userId")]
    InvalidUserId,
    #[error("Email domain must match company domain")]
    DomainMismatch,
    #[error("userId and userEmail must belong to the signed-in user")]
    NotCaller,
    #[error("Profile already exists for this user")]
    ProfileExists,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Validated `create-company` input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyInput {
    pub domain: String,
    pub display_name: String,
    pub user_email: String,
    pub user_id: Uuid,
}

fn required(value: Option<&String>) -> Result<&str, CompanyError> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or(CompanyError::MissingFields)
}

/// Decode the raw request body. Any JSON or shape error is a
/// [`CompanyError::InvalidBody`], whatever the declared content type.
///
/// # Errors
///
/// Malformed JSON or fields of the wrong type.
pub fn parse_request(body: &[u8]) -> Result<CreateCompanyRequest, CompanyError> {
    Ok(serde_json::from_slice(body)?)
}

/// Apply the function's field and email-domain rules.
///
/// # Errors
///
/// Returns the first violated rule, in the order the function checks them.
pub fn validate_request(req: &CreateCompanyRequest) -> Result<CompanyInput, CompanyError> {
    let domain = required(req.domain.as_ref())?;
    let display_name = required(req.display_name.as_ref())?;
    let user_email = required(req.user_email.as_ref())?;
    let user_id = required(req.user_id.as_ref())?;

    let user_id = Uuid::parse_str(user_id).map_err(|_| CompanyError::InvalidUserId)?;
    let domain = normalize_domain_slug(domain);
    let user_email = normalize_email(user_email).ok_or(CompanyError::DomainMismatch)?;
    if email_domain(&user_email) != Some(domain.as_str()) {
        return Err(CompanyError::DomainMismatch);
    }

    Ok(CompanyInput { domain, display_name: display_name.to_owned(), user_email, user_id })
}

/// Reject requests made on behalf of someone other than the session user.
///
/// # Errors
///
/// Returns [`CompanyError::NotCaller`] when id or email differ.
pub fn ensure_caller(input: &CompanyInput, caller: &SessionUser) -> Result<(), CompanyError> {
    if input.user_id == caller.id && input.user_email == caller.email {
        Ok(())
    } else {
        Err(CompanyError::NotCaller)
    }
}

/// Create (or join) the company and the caller's profile.
///
/// # Errors
///
/// Returns [`CompanyError::ProfileExists`] when the user already onboarded,
/// or a database error.
pub async fn create_company(pool: &PgPool, input: &CompanyInput) -> Result<CreateCompanyResponse, CompanyError> {
    let mut tx = pool.begin().await?;

    let domain_id = upsert_domain(&mut tx, &input.domain, &input.display_name).await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE domain_id = $1")
        .bind(domain_id)
        .fetch_one(&mut *tx)
        .await?;
    let is_first_user = existing == 0;
    let role = Role::for_new_profile(is_first_user);

    let inserted = sqlx::query(
        "INSERT INTO profiles (id, domain_id, email, full_name, role)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(input.user_id)
    .bind(domain_id)
    .bind(&input.user_email)
    .bind(email_local_part(&input.user_email))
    .bind(role.as_str())
    .execute(&mut *tx)
    .await;

    if let Err(e) = inserted {
        return Err(if is_unique_violation(&e) { CompanyError::ProfileExists } else { e.into() });
    }

    tx.commit().await?;
    tracing::info!(%domain_id, user_id = %input.user_id, role = role.as_str(), "company profile created");

    Ok(CreateCompanyResponse { success: true, domain_id, is_first_user, role })
}

/// Find the domain by name or create it, then lock its row for the rest of the transaction.
async fn upsert_domain(tx: &mut Transaction<'_, Postgres>, name: &str, display_name: &str) -> Result<Uuid, sqlx::Error> {
    let created = sqlx::query(
        "INSERT INTO domains (name, display_name) VALUES ($1, $2)
         ON CONFLICT (name) DO NOTHING
         RETURNING id",
    )
    .bind(name)
    .bind(display_name)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(row) = created {
        tracing::info!(domain = %name, "domain created");
        return Ok(row.get("id"));
    }

    sqlx::query_scalar("SELECT id FROM domains WHERE name = $1 FOR UPDATE")
        .bind(name)
        .fetch_one(&mut **tx)
        .await
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505")
}

#[cfg(test)]
#[path = "company_test.rs"]
mod tests;
