use super::*;
use crate::state::test_helpers;

#[test]
fn escape_like_escapes_wildcards() {
    assert_eq!(escape_like("ann"), "ann");
    assert_eq!(escape_like("50%_off"), r"50\%\_off");
    assert_eq!(escape_like(r"a\b"), r"a\\b");
}

// The lazy test pool never connects; these pass only when no query runs.

#[tokio::test]
async fn blank_search_returns_nothing_without_querying() {
    let state = test_helpers::test_app_state();
    let caller = test_helpers::profile(Role::Member);
    let found = search_members(&state.pool, &caller, "   ", &[]).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn empty_full_name_is_rejected() {
    let state = test_helpers::test_app_state();
    let req = UpdateProfileRequest { full_name: Some("  ".into()), avatar_url: None };
    let err = update_profile(&state.pool, Uuid::new_v4(), &req).await.unwrap_err();
    assert!(matches!(err, ProfileError::Invalid(_)));
}

#[tokio::test]
async fn malformed_email_lookup_is_none() {
    let state = test_helpers::test_app_state();
    let found = find_member_by_email(&state.pool, Uuid::new_v4(), "not-an-email").await.unwrap();
    assert!(found.is_none());
}

// =============================================================================
// live database
// =============================================================================

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn profile_lookup_distinguishes_missing_from_found() {
    use crate::db::live::{integration_pool, seed_member, seed_user};

    let pool = integration_pool().await;
    let loner = seed_user(&pool, "loner@nowhere").await;
    assert!(fetch_profile_with_domain(&pool, loner.id).await.unwrap().is_none());
    assert!(matches!(require_profile(&pool, loner.id).await, Err(ProfileError::ProfileMissing)));

    let (ann, _) = seed_member(&pool, "ann@acme").await;
    let found = fetch_profile_with_domain(&pool, ann.id).await.unwrap().expect("profile");
    assert_eq!(found.profile.role, Role::Admin);
    assert_eq!(found.domain.expect("domain").name, "acme");
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn search_is_scoped_to_domain_and_excludes_caller() {
    use crate::db::live::{integration_pool, seed_member};

    let pool = integration_pool().await;
    let (_, ann) = seed_member(&pool, "ann@acme").await;
    let (_, anna) = seed_member(&pool, "anna@acme").await;
    let (_, andy) = seed_member(&pool, "andy@acme").await;
    seed_member(&pool, "ann@globex").await;

    let found = search_members(&pool, &ann, "an", &[]).await.unwrap();
    let ids: Vec<Uuid> = found.iter().map(|m| m.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&anna.id) && ids.contains(&andy.id));

    let found = search_members(&pool, &ann, "an", &[anna.id]).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, andy.id);

    let members = list_members(&pool, ann.domain_id, ann.id).await.unwrap();
    assert_eq!(members.len(), 2);
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn search_caps_results() {
    use crate::db::live::{integration_pool, seed_member};

    let pool = integration_pool().await;
    let (_, caller) = seed_member(&pool, "boss@acme").await;
    for i in 0..15 {
        seed_member(&pool, &format!("user{i}@acme")).await;
    }
    let found = search_members(&pool, &caller, "user", &[]).await.unwrap();
    assert_eq!(found.len(), usize::try_from(SEARCH_LIMIT).unwrap());
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn update_profile_changes_name_and_clears_avatar() {
    use crate::db::live::{integration_pool, seed_member};

    let pool = integration_pool().await;
    let (ann, _) = seed_member(&pool, "ann@acme").await;
    let req = UpdateProfileRequest { full_name: Some("Ann Lee".into()), avatar_url: Some("https://x/a.png".into()) };
    let updated = update_profile(&pool, ann.id, &req).await.unwrap();
    assert_eq!(updated.full_name, "Ann Lee");
    assert_eq!(updated.avatar_url.as_deref(), Some("https://x/a.png"));

    let req = UpdateProfileRequest { full_name: None, avatar_url: Some(String::new()) };
    let updated = update_profile(&pool, ann.id, &req).await.unwrap();
    assert_eq!(updated.full_name, "Ann Lee");
    assert!(updated.avatar_url.is_none());
}
