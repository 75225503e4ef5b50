use super::*;
use crate::services::storage::MemoryObjectStore;
use crate::state::test_helpers;

#[tokio::test]
async fn blank_name_lookup_is_none_without_querying() {
    let state = test_helpers::test_app_state();
    assert!(find_by_name(&state.pool, "   ").await.unwrap().is_none());
}

#[tokio::test]
async fn members_cannot_rename_workspace() {
    let state = test_helpers::test_app_state();
    let member = test_helpers::profile(Role::Member);
    let err = update_display_name(&state.pool, &member, "New Name").await.unwrap_err();
    assert!(matches!(err, DomainError::NotAdmin));
}

#[tokio::test]
async fn admins_cannot_blank_the_display_name() {
    let state = test_helpers::test_app_state();
    let admin = test_helpers::profile(Role::Admin);
    let err = update_display_name(&state.pool, &admin, "  ").await.unwrap_err();
    assert!(matches!(err, DomainError::EmptyDisplayName));
}

#[tokio::test]
async fn logo_upload_checks_role_and_type_before_storing() {
    let state = test_helpers::test_app_state();
    let store = MemoryObjectStore::default();

    let member = test_helpers::profile(Role::Member);
    let err = upload_logo(&state.pool, &store, "http://x", &member, "image/png", b"png").await.unwrap_err();
    assert!(matches!(err, DomainError::NotAdmin));

    let admin = test_helpers::profile(Role::Admin);
    let err = upload_logo(&state.pool, &store, "http://x", &admin, "text/plain", b"hi").await.unwrap_err();
    assert!(matches!(err, DomainError::Storage(StorageError::UnsupportedType(_))));
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn admin_renames_and_uploads_logo() {
    use crate::db::live::{integration_pool, seed_member};

    let pool = integration_pool().await;
    let (_, admin) = seed_member(&pool, "ann@acme").await;
    let (_, member) = seed_member(&pool, "bob@acme").await;
    assert_eq!(member.role, Role::Member);

    let found = find_by_name(&pool, " ACME ").await.unwrap().expect("domain");
    assert_eq!(found.id, admin.domain_id);

    let renamed = update_display_name(&pool, &admin, "Acme Corp").await.unwrap();
    assert_eq!(renamed.display_name, "Acme Corp");

    let store = MemoryObjectStore::default();
    let updated = upload_logo(&pool, &store, "http://localhost:3000/", &admin, "image/png", b"\x89PNG")
        .await
        .unwrap();
    let url = updated.logo_url.expect("logo url");
    assert!(url.starts_with(&format!("http://localhost:3000/storage/logos/{}/", admin.domain_id)));
    let key = url.trim_start_matches("http://localhost:3000/storage/");
    assert!(store.exists(key).await.unwrap());
}
