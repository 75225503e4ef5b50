use super::*;
use crate::state::test_helpers;

#[test]
fn titles_are_trimmed_and_required() {
    assert_eq!(clean_title("  Roadmap ").unwrap(), "Roadmap");
    assert!(matches!(clean_title("   "), Err(WhiteboardError::Invalid(_))));
}

#[test]
fn unknown_permission_values_are_dropped() {
    assert_eq!(parse_permission("editor"), Some(Permission::Editor));
    assert_eq!(parse_permission("owner"), None);
}

#[tokio::test]
async fn blank_title_is_rejected_before_querying() {
    let state = test_helpers::test_app_state();
    let caller = test_helpers::profile(tenancy::Role::Member);
    let req = CreateWhiteboardRequest { title: " ".into(), description: None };
    assert!(matches!(create(&state.pool, &caller, &req).await, Err(WhiteboardError::Invalid(_))));

    let req = UpdateWhiteboardRequest { title: Some(String::new()), ..UpdateWhiteboardRequest::default() };
    assert!(matches!(
        update(&state.pool, &caller, Uuid::new_v4(), &req).await,
        Err(WhiteboardError::Invalid(_))
    ));
}

// =============================================================================
// live database
// =============================================================================

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;
    use crate::db::live::{integration_pool, seed_member};

    async fn board(pool: &PgPool, owner: &Profile, title: &str) -> Whiteboard {
        let req = CreateWhiteboardRequest { title: title.into(), description: Some("desc".into()) };
        create(pool, owner, &req).await.expect("create whiteboard")
    }

    async fn share(pool: &PgPool, board: Uuid, user: Uuid, permission: Permission) {
        sqlx::query("INSERT INTO whiteboard_shares (whiteboard_id, user_id, permission) VALUES ($1, $2, $3)")
            .bind(board)
            .bind(user)
            .bind(permission.as_str())
            .execute(pool)
            .await
            .unwrap();
    }

    async fn group_share(pool: &PgPool, owner: &Profile, board: Uuid, member: Uuid, permission: Permission) {
        let group: Uuid = sqlx::query_scalar(
            "INSERT INTO groups (name, domain_id, created_by) VALUES ('team', $1, $2) RETURNING id",
        )
        .bind(owner.domain_id)
        .bind(owner.id)
        .fetch_one(pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO group_members (group_id, user_id) VALUES ($1, $2)")
            .bind(group)
            .bind(member)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO group_whiteboard_shares (whiteboard_id, group_id, permission) VALUES ($1, $2, $3)")
            .bind(board)
            .bind(group)
            .bind(permission.as_str())
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn owner_sees_board_and_stranger_does_not() {
        let pool = integration_pool().await;
        let (_, ann) = seed_member(&pool, "ann@acme").await;
        let (_, bob) = seed_member(&pool, "bob@acme").await;
        let created = board(&pool, &ann, "Roadmap").await;
        assert_eq!(created.data, serde_json::json!({}));

        let (_, access) = load_with_access(&pool, &ann, created.id).await.unwrap();
        assert_eq!(access, Access::Owner);
        assert!(matches!(load_with_access(&pool, &bob, created.id).await, Err(WhiteboardError::NotFound)));
        assert!(list_visible(&pool, &bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn highest_of_direct_and_group_grants_wins() {
        let pool = integration_pool().await;
        let (_, ann) = seed_member(&pool, "ann@acme").await;
        let (_, bob) = seed_member(&pool, "bob@acme").await;
        let created = board(&pool, &ann, "Roadmap").await;

        share(&pool, created.id, bob.id, Permission::Viewer).await;
        group_share(&pool, &ann, created.id, bob.id, Permission::Editor).await;

        let (_, access) = load_with_access(&pool, &bob, created.id).await.unwrap();
        assert_eq!(access, Access::Granted(Permission::Editor));

        let cards = list_visible(&pool, &bob).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].owner.as_ref().map(|o| o.id), Some(ann.id));
        assert_eq!(cards[0].collaborators.iter().map(|c| c.id).collect::<Vec<_>>(), vec![bob.id]);
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn viewers_cannot_edit_and_editors_can() {
        let pool = integration_pool().await;
        let (_, ann) = seed_member(&pool, "ann@acme").await;
        let (_, bob) = seed_member(&pool, "bob@acme").await;
        let created = board(&pool, &ann, "Roadmap").await;
        share(&pool, created.id, bob.id, Permission::Viewer).await;

        let req = UpdateWhiteboardRequest { data: Some(serde_json::json!({"shapes": []})), ..Default::default() };
        assert!(matches!(update(&pool, &bob, created.id, &req).await, Err(WhiteboardError::Forbidden(_))));

        sqlx::query("UPDATE whiteboard_shares SET permission = 'editor' WHERE user_id = $1")
            .bind(bob.id)
            .execute(&pool)
            .await
            .unwrap();
        let updated = update(&pool, &bob, created.id, &req).await.unwrap();
        assert_eq!(updated.data, serde_json::json!({"shapes": []}));
        assert_eq!(updated.title, "Roadmap");
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn list_is_ordered_by_last_update() {
        let pool = integration_pool().await;
        let (_, ann) = seed_member(&pool, "ann@acme").await;
        let first = board(&pool, &ann, "First").await;
        let second = board(&pool, &ann, "Second").await;

        let titles: Vec<String> = list_visible(&pool, &ann).await.unwrap().into_iter().map(|c| c.whiteboard.title).collect();
        assert_eq!(titles, vec!["Second", "First"]);

        let req = UpdateWhiteboardRequest { description: Some("bumped".into()), ..Default::default() };
        update(&pool, &ann, first.id, &req).await.unwrap();
        let ids: Vec<Uuid> = list_visible(&pool, &ann).await.unwrap().into_iter().map(|c| c.whiteboard.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn only_owner_deletes_and_delete_cascades() {
        let pool = integration_pool().await;
        let (_, ann) = seed_member(&pool, "ann@acme").await;
        let (_, bob) = seed_member(&pool, "bob@acme").await;
        let created = board(&pool, &ann, "Roadmap").await;
        share(&pool, created.id, bob.id, Permission::Editor).await;

        assert!(matches!(delete(&pool, &bob, created.id).await, Err(WhiteboardError::Forbidden(_))));
        delete(&pool, &ann, created.id).await.unwrap();

        assert!(list_visible(&pool, &ann).await.unwrap().is_empty());
        let shares: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM whiteboard_shares")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(shares, 0);
        assert!(matches!(delete(&pool, &ann, created.id).await, Err(WhiteboardError::NotFound)));
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn other_domains_cannot_see_the_board() {
        let pool = integration_pool().await;
        let (_, ann) = seed_member(&pool, "ann@acme").await;
        let (_, eve) = seed_member(&pool, "eve@globex").await;
        let created = board(&pool, &ann, "Roadmap").await;
        assert!(matches!(load_with_access(&pool, &eve, created.id).await, Err(WhiteboardError::NotFound)));
    }
}
