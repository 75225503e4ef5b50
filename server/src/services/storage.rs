//! Object storage for company logos.
//!
//! ARCHITECTURE
//! ============
//! Uploads go through the [`ObjectStore`] trait so handlers never touch the
//! filesystem directly. The production store writes under `STORAGE_DIR`,
//! which the router also serves read-only at `/storage`. Keys are
//! content-addressed (`logos/<domain>/<sha256>.<ext>`), so re-uploading the
//! same image is idempotent and URLs never serve stale bytes.

use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::services::session::bytes_to_hex;

/// Largest logo accepted, in bytes.
pub const MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;

/// URL prefix the router serves stored objects under.
pub const STORAGE_ROUTE: &str = "/storage";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unsupported content type: {0}")]
    UnsupportedType(String),
    #[error("object too large: {0} bytes")]
    TooLarge(usize),
    #[error("empty upload")]
    Empty,
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous object.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Whether an object exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// File extension for an accepted image content type.
pub fn logo_extension(content_type: &str) -> Result<&'static str, StorageError> {
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    match essence.as_str() {
        "image/png" => Ok("png"),
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/svg+xml" => Ok("svg"),
        "image/webp" => Ok("webp"),
        _ => Err(StorageError::UnsupportedType(content_type.to_owned())),
    }
}

/// Validate an upload and derive its content-addressed key.
pub fn logo_key(domain_id: Uuid, content_type: &str, bytes: &[u8]) -> Result<String, StorageError> {
    if bytes.is_empty() {
        return Err(StorageError::Empty);
    }
    if bytes.len() > MAX_LOGO_BYTES {
        return Err(StorageError::TooLarge(bytes.len()));
    }
    let ext = logo_extension(content_type)?;
    let digest = Sha256::digest(bytes);
    Ok(format!("logos/{domain_id}/{}.{ext}", bytes_to_hex(&digest)))
}

/// Absolute URL for a stored key.
#[must_use]
pub fn public_url(base_url: &str, key: &str) -> String {
    format!("{}{STORAGE_ROUTE}/{key}", base_url.trim_end_matches('/'))
}

fn checked_relative(key: &str) -> Result<&Path, StorageError> {
    let path = Path::new(key);
    let safe = !key.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)));
    if safe { Ok(path) } else { Err(StorageError::InvalidKey(key.to_owned())) }
}

// =============================================================================
// FILESYSTEM STORE
// =============================================================================

pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait::async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.root.join(checked_relative(key)?);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Write-then-rename so readers never observe a partial file.
        let tmp = path.with_extension("part");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(%key, size = bytes.len(), "stored object");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.root.join(checked_relative(key)?);
        Ok(tokio::fs::try_exists(path).await?)
    }
}

// =============================================================================
// IN-MEMORY STORE (tests)
// =============================================================================

#[cfg(test)]
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: std::sync::Mutex<std::collections::HashMap<String, Vec<u8>>>,
}

#[cfg(test)]
#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        checked_relative(key)?;
        self.objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self
            .objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(key))
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
