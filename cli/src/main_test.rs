use std::path::Path;

use clap::CommandFactory;

use super::*;

#[test]
fn command_tree_is_well_formed() {
    Cli::command().debug_assert();
}

#[test]
fn logo_type_follows_extension() {
    assert_eq!(logo_content_type(Path::new("logo.PNG")).unwrap(), "image/png");
    assert_eq!(logo_content_type(Path::new("a/b/logo.jpeg")).unwrap(), "image/jpeg");
    assert_eq!(logo_content_type(Path::new("logo.svg")).unwrap(), "image/svg+xml");
    assert!(matches!(logo_content_type(Path::new("logo.gif")), Err(CliError::Usage(_))));
    assert!(logo_content_type(Path::new("logo")).is_err());
}

#[test]
fn share_add_parses_permission_and_email() {
    let cli = Cli::try_parse_from([
        "boardspace", "share", "add", "00000000-0000-0000-0000-000000000000", "--email", "bo@acme.com", "--permission", "editor",
    ])
    .unwrap();
    let Command::Share(ShareCommand { command: ShareSubcommand::Add { email, user, permission, .. } }) = cli.command else {
        panic!("expected share add");
    };
    assert_eq!(email.as_deref(), Some("bo@acme.com"));
    assert!(user.is_none());
    assert_eq!(permission, Permission::Editor);
}

#[test]
fn unknown_permission_is_rejected() {
    let result = Cli::try_parse_from([
        "boardspace", "invites", "create", "00000000-0000-0000-0000-000000000000", "--permission", "owner",
    ]);
    assert!(result.is_err());
}
