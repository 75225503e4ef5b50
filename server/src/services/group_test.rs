use super::*;
use crate::state::test_helpers;
use time::OffsetDateTime;

fn group_of(creator: &Profile) -> Group {
    Group {
        id: Uuid::new_v4(),
        name: "Design".into(),
        description: String::new(),
        domain_id: creator.domain_id,
        created_by: creator.id,
        created_at: OffsetDateTime::now_utc(),
        updated_at: OffsetDateTime::now_utc(),
    }
}

#[test]
fn creator_and_admins_manage_groups() {
    let creator = test_helpers::profile(Role::Member);
    let group = group_of(&creator);
    assert!(can_manage(&creator, &group));

    let mut other = test_helpers::profile(Role::Member);
    other.domain_id = creator.domain_id;
    assert!(!can_manage(&other, &group));

    other.role = Role::Admin;
    assert!(can_manage(&other, &group));
}

#[test]
fn admins_of_other_domains_do_not_manage_groups() {
    let creator = test_helpers::profile(Role::Member);
    let group = group_of(&creator);
    let outsider = test_helpers::profile(Role::Admin);
    assert!(!can_manage(&outsider, &group));
}

#[tokio::test]
async fn blank_name_is_rejected_before_querying() {
    let state = test_helpers::test_app_state();
    let caller = test_helpers::profile(Role::Member);
    let req = CreateGroupRequest { name: "  ".into(), description: None };
    assert!(matches!(create(&state.pool, &caller, &req).await, Err(GroupError::EmptyName)));
}

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;
    use crate::db::live::{integration_pool, seed_member};

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn membership_lifecycle() {
        let pool = integration_pool().await;
        let (_, admin) = seed_member(&pool, "ann@acme").await;
        let (_, bob) = seed_member(&pool, "bob@acme").await;
        let (_, cat) = seed_member(&pool, "cat@acme").await;
        let (_, eve) = seed_member(&pool, "eve@globex").await;

        let team = create(&pool, &bob, &CreateGroupRequest { name: "Design".into(), description: Some("ui".into()) })
            .await
            .unwrap();
        add_member(&pool, &bob, team.id, cat.id).await.unwrap();
        assert!(matches!(add_member(&pool, &bob, team.id, cat.id).await, Err(GroupError::AlreadyMember)));
        assert!(matches!(add_member(&pool, &bob, team.id, eve.id).await, Err(GroupError::UserNotInDomain)));
        assert!(matches!(add_member(&pool, &cat, team.id, bob.id).await, Err(GroupError::Forbidden)));

        let summaries = list(&pool, &admin).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].member_count, 1);
        assert_eq!(members(&pool, &cat, team.id).await.unwrap()[0].id, cat.id);
        assert!(matches!(get(&pool, &eve, team.id).await, Err(GroupError::NotFound)));

        remove_member(&pool, &admin, team.id, cat.id).await.unwrap();
        assert!(members(&pool, &bob, team.id).await.unwrap().is_empty());

        delete(&pool, &admin, team.id).await.unwrap();
        assert!(list(&pool, &bob).await.unwrap().is_empty());
    }
}
