use tenancy::{Access, Permission, Whiteboard};
use time::Duration;
use uuid::Uuid;

use super::*;

fn member(name: &str) -> MemberSummary {
    MemberSummary { id: Uuid::new_v4(), full_name: name.to_owned(), email: format!("{}@acme.com", name.to_lowercase()), avatar_url: None }
}

fn card(collaborators: Vec<MemberSummary>, updated_at: OffsetDateTime) -> WhiteboardCard {
    WhiteboardCard {
        whiteboard: Whiteboard {
            id: Uuid::nil(),
            title: "Roadmap".to_owned(),
            description: String::new(),
            owner_id: Uuid::nil(),
            domain_id: Uuid::nil(),
            data: serde_json::json!({}),
            created_at: updated_at,
            updated_at,
        },
        owner: Some(member("Ada Lovelace")),
        collaborators,
        access: Access::Granted(Permission::Editor),
    }
}

#[test]
fn card_shows_access_owner_and_age() {
    let now = OffsetDateTime::now_utc();
    let lines = card_lines(&card(vec![], now - Duration::days(1)), now);
    assert_eq!(lines[0], format!("{}  Roadmap  [editor]", Uuid::nil()));
    assert_eq!(lines[1], "    owner: Ada Lovelace  updated: Yesterday");
    assert_eq!(lines.len(), 2);
}

#[test]
fn card_collapses_extra_collaborators() {
    let now = OffsetDateTime::now_utc();
    let people = vec![member("Ann Bee"), member("Cal Dee"), member("Eve Fox"), member("Gus"), member("Hal")];
    let lines = card_lines(&card(people, now), now);
    assert_eq!(lines.last().unwrap(), "    shared with: AB CD EF +2");
}

#[test]
fn member_line_includes_initials() {
    let m = member("grace hopper");
    assert!(member_line(&m).starts_with("[GH] grace hopper <grace hopper@acme.com>"));
}
