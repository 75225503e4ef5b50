mod api;
mod controller;
mod error;
mod output;
mod search;
mod store;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tenancy::email::{DomainSelection, email_domain, validate_signup};
use tenancy::session::SessionState;
use tenancy::{
    CreateCompanyRequest, CreateGroupRequest, CreateInviteRequest, CreateWhiteboardRequest, GroupShareRequest,
    Permission, ProfileWithDomain, SessionUser, ShareRequest, SignInRequest, SignUpRequest, UpdateDomainRequest,
    UpdateProfileRequest, UpdateWhiteboardRequest,
};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::controller::SessionController;
use crate::error::CliError;
use crate::store::{SessionStore, StoredSession};

#[derive(Parser, Debug)]
#[command(name = "boardspace", about = "Boardspace workspace CLI")]
struct Cli {
    #[arg(long, env = "BOARDSPACE_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Where the session token and chosen workspace are kept.
    #[arg(long, env = "BOARDSPACE_STATE_FILE")]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve and print the current session state.
    Status,
    Domain(DomainCommand),
    Signup(Credentials),
    Signin(Credentials),
    Signout,
    /// Create the workspace for a signed-in user without a profile.
    Onboard {
        #[arg(long)]
        company: String,
    },
    Profile(ProfileCommand),
    Workspace(WorkspaceCommand),
    Members(MembersCommand),
    Boards(BoardsCommand),
    Share(ShareCommand),
    Groups(GroupsCommand),
    Invites(InvitesCommand),
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long)]
    email: String,
    #[arg(long, env = "BOARDSPACE_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct DomainCommand {
    #[command(subcommand)]
    command: DomainSubcommand,
}

#[derive(Subcommand, Debug)]
enum DomainSubcommand {
    /// Pick an existing workspace by name.
    Select { name: String },
    /// Start a new workspace.
    New,
    Clear,
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        full_name: Option<String>,
        /// Empty string removes the avatar.
        #[arg(long)]
        avatar_url: Option<String>,
    },
}

#[derive(Args, Debug)]
struct WorkspaceCommand {
    #[command(subcommand)]
    command: WorkspaceSubcommand,
}

#[derive(Subcommand, Debug)]
enum WorkspaceSubcommand {
    Rename { display_name: String },
    /// Upload a company logo (png, jpg, svg or webp).
    Logo { file: PathBuf },
}

#[derive(Args, Debug)]
struct MembersCommand {
    #[command(subcommand)]
    command: MembersSubcommand,
}

#[derive(Subcommand, Debug)]
enum MembersSubcommand {
    List,
    /// Search by name or email. Without --query, reads queries from stdin.
    Search {
        #[arg(long)]
        query: Option<String>,
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<Uuid>,
    },
}

#[derive(Args, Debug)]
struct BoardsCommand {
    #[command(subcommand)]
    command: BoardsSubcommand,
}

#[derive(Subcommand, Debug)]
enum BoardsSubcommand {
    List,
    Create {
        #[arg(long, default_value = "Untitled Whiteboard")]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    Show { id: Uuid },
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Replacement canvas document as JSON.
        #[arg(long)]
        data: Option<String>,
    },
    Delete {
        id: Uuid,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct ShareCommand {
    #[command(subcommand)]
    command: ShareSubcommand,
}

#[derive(Subcommand, Debug)]
enum ShareSubcommand {
    List { board: Uuid },
    Add {
        board: Uuid,
        #[arg(long, required_unless_present = "user")]
        email: Option<String>,
        #[arg(long, conflicts_with = "email")]
        user: Option<Uuid>,
        #[arg(long, default_value = "viewer")]
        permission: Permission,
    },
    Remove { board: Uuid, user: Uuid },
    Group(ShareGroupCommand),
}

#[derive(Args, Debug)]
struct ShareGroupCommand {
    #[command(subcommand)]
    command: ShareGroupSubcommand,
}

#[derive(Subcommand, Debug)]
enum ShareGroupSubcommand {
    List { board: Uuid },
    Add {
        board: Uuid,
        group: Uuid,
        #[arg(long, default_value = "viewer")]
        permission: Permission,
    },
    Remove { board: Uuid, group: Uuid },
}

#[derive(Args, Debug)]
struct GroupsCommand {
    #[command(subcommand)]
    command: GroupsSubcommand,
}

#[derive(Subcommand, Debug)]
enum GroupsSubcommand {
    List,
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Members { group: Uuid },
    Add { group: Uuid, user: Uuid },
    Remove { group: Uuid, user: Uuid },
    Delete { group: Uuid },
}

#[derive(Args, Debug)]
struct InvitesCommand {
    #[command(subcommand)]
    command: InvitesSubcommand,
}

#[derive(Subcommand, Debug)]
enum InvitesSubcommand {
    Create {
        board: Uuid,
        #[arg(long, default_value = "viewer")]
        permission: Permission,
        #[arg(long)]
        ttl_hours: Option<u32>,
    },
    List { board: Uuid },
    Revoke { board: Uuid, token: String },
    /// Open a whiteboard through an invite link token.
    Open { token: String },
    /// Replace the canvas document through an editor invite.
    Write {
        token: String,
        #[arg(long)]
        data: String,
    },
}

/// Process-wide state: the persisted session and the controller built from it.
struct App {
    store: SessionStore,
    saved: StoredSession,
    session: SessionController<ApiClient>,
}

impl App {
    async fn load(cli: &Cli) -> Result<Self, CliError> {
        let store = SessionStore::new(cli.state_file.clone().unwrap_or_else(store::default_path));
        let saved = store.load().await?;
        let client = ApiClient::new(&cli.base_url, saved.token.clone());
        let session = SessionController::new(client, saved.selected_domain.clone());
        Ok(Self { store, saved, session })
    }

    fn client(&self) -> &ApiClient {
        self.session.backend()
    }

    /// Client for calls that need credentials.
    fn authed(&self) -> Result<&ApiClient, CliError> {
        if self.client().token().is_none() {
            return Err(CliError::NotSignedIn);
        }
        Ok(self.client())
    }

    async fn persist(&mut self) -> Result<(), CliError> {
        self.saved = StoredSession {
            token: self.client().token().map(str::to_owned),
            selected_domain: self.session.machine().selected_domain().cloned(),
        };
        self.store.save(&self.saved).await
    }

    /// Resolve the session, forgetting a token the server no longer accepts.
    async fn resolve(&mut self) -> Result<&SessionState, CliError> {
        self.session.resolve().await?;
        if self.session.machine().user().is_none() && self.client().token().is_some() {
            self.session.backend_mut().set_token(None);
            self.persist().await?;
        }
        Ok(self.session.state())
    }

    async fn signed_in_user(&mut self) -> Result<SessionUser, CliError> {
        self.resolve().await?;
        self.session.machine().user().cloned().ok_or(CliError::NotSignedIn)
    }

    async fn after_sign_in(&mut self, user: SessionUser) -> Result<(), CliError> {
        self.persist().await?;
        self.session.auth_changed(Some(user)).await?;
        output::print_session(self.session.machine());
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut app = App::load(&cli).await?;
    match cli.command {
        Command::Status => {
            app.resolve().await?;
            output::print_session(app.session.machine());
            Ok(())
        }
        Command::Domain(domain) => run_domain(&mut app, domain.command).await,
        Command::Signup(credentials) => run_signup(&mut app, credentials).await,
        Command::Signin(credentials) => {
            let body = SignInRequest { email: credentials.email, password: credentials.password };
            let info = app.session.backend_mut().sign_in(&body).await?;
            app.after_sign_in(info.user).await
        }
        Command::Signout => {
            let result = app.session.backend_mut().sign_out().await;
            app.session.signed_out();
            app.persist().await?;
            if let Err(error) = result {
                eprintln!("warning: server sign-out failed: {error}");
            }
            println!("signed out");
            Ok(())
        }
        Command::Onboard { company } => run_onboard(&mut app, company).await,
        Command::Profile(profile) => run_profile(&app, profile.command).await,
        Command::Workspace(workspace) => run_workspace(&app, workspace.command).await,
        Command::Members(members) => run_members(&app, members.command).await,
        Command::Boards(boards) => run_boards(&app, boards.command).await,
        Command::Share(share) => run_share(&app, share.command).await,
        Command::Groups(groups) => run_groups(&app, groups.command).await,
        Command::Invites(invites) => run_invites(&app, invites.command).await,
    }
}

async fn run_domain(app: &mut App, command: DomainSubcommand) -> Result<(), CliError> {
    if app.client().token().is_some() {
        return Err(CliError::Usage("already signed in; run `boardspace signout` to switch workspace".to_owned()));
    }
    // Without a token this settles on the signed-out view without a request.
    app.resolve().await?;
    match command {
        DomainSubcommand::Select { name } => {
            let selection = DomainSelection::from_input(&name)
                .ok_or_else(|| CliError::Usage("workspace name is empty".to_owned()))?;
            if let Some(slug) = selection.slug() {
                match app.client().domain(slug).await {
                    Ok(Some(domain)) => println!("workspace: {} ({})", domain.display_name, domain.name),
                    Ok(None) => println!("workspace `{slug}` does not exist yet"),
                    Err(error) => eprintln!("warning: could not look up workspace: {error}"),
                }
            }
            app.session.select_domain(selection);
        }
        DomainSubcommand::New => {
            app.session.select_domain(DomainSelection::CreateNew);
        }
        DomainSubcommand::Clear => {
            app.session.clear_domain();
        }
    }
    app.persist().await?;
    output::print_session(app.session.machine());
    Ok(())
}

async fn run_signup(app: &mut App, credentials: Credentials) -> Result<(), CliError> {
    let selection = app.saved.selected_domain.clone().ok_or(CliError::NoWorkspaceSelected)?;
    let email = validate_signup(&credentials.email, &credentials.password, &selection)?;
    let body = SignUpRequest {
        email,
        password: credentials.password,
        domain: selection.slug().map(str::to_owned),
        creating_workspace: selection.is_new(),
    };
    let info = app.session.backend_mut().sign_up(&body).await?;
    app.after_sign_in(info.user).await
}

async fn run_onboard(app: &mut App, company: String) -> Result<(), CliError> {
    let user = app.signed_in_user().await?;
    if matches!(app.session.state(), SessionState::Ready(_)) {
        return Err(CliError::Usage("this account already belongs to a workspace".to_owned()));
    }
    let domain = email_domain(&user.email)
        .ok_or_else(|| CliError::Usage(format!("cannot derive a workspace from `{}`", user.email)))?
        .to_owned();
    let body = CreateCompanyRequest {
        domain: Some(domain),
        display_name: Some(company),
        user_email: Some(user.email.clone()),
        user_id: Some(user.id.to_string()),
    };
    let created = app.client().create_company(&body).await?;
    println!("joined workspace as {}{}", created.role, if created.is_first_user { " (first member)" } else { "" });
    app.session.onboarding_completed().await?;
    output::print_session(app.session.machine());
    Ok(())
}

async fn run_profile(app: &App, command: ProfileSubcommand) -> Result<(), CliError> {
    let client = app.authed()?;
    match command {
        ProfileSubcommand::Show => {
            let ProfileWithDomain { profile, domain } = client.profile().await?;
            println!("{} <{}>  role: {}", profile.full_name, profile.email, profile.role);
            if let Some(avatar) = &profile.avatar_url {
                println!("avatar: {avatar}");
            }
            match domain {
                Some(domain) => println!("workspace: {} ({})", domain.display_name, domain.name),
                None => println!("workspace: unavailable"),
            }
        }
        ProfileSubcommand::Update { full_name, avatar_url } => {
            let profile = client.update_profile(&UpdateProfileRequest { full_name, avatar_url }).await?;
            output::print_json(&profile)?;
        }
    }
    Ok(())
}

fn logo_content_type(path: &std::path::Path) -> Result<&'static str, CliError> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => Ok("image/png"),
        Some("jpg" | "jpeg") => Ok("image/jpeg"),
        Some("svg") => Ok("image/svg+xml"),
        Some("webp") => Ok("image/webp"),
        _ => Err(CliError::Usage(format!("unsupported logo file `{}`", path.display()))),
    }
}

async fn run_workspace(app: &App, command: WorkspaceSubcommand) -> Result<(), CliError> {
    let client = app.authed()?;
    let domain = match command {
        WorkspaceSubcommand::Rename { display_name } => {
            client.rename_domain(&UpdateDomainRequest { display_name }).await?
        }
        WorkspaceSubcommand::Logo { file } => {
            let content_type = logo_content_type(&file)?;
            let bytes = tokio::fs::read(&file).await?;
            client.upload_logo(content_type, bytes).await?
        }
    };
    output::print_json(&domain)
}

async fn run_members(app: &App, command: MembersSubcommand) -> Result<(), CliError> {
    let client = app.authed()?;
    match command {
        MembersSubcommand::List => output::print_members(&client.members().await?),
        MembersSubcommand::Search { query: Some(query), exclude } => {
            output::print_members(&client.search_members(&query, &exclude).await?);
        }
        MembersSubcommand::Search { query: None, exclude } => {
            search::run_interactive(client.clone(), exclude).await?;
        }
    }
    Ok(())
}

async fn run_boards(app: &App, command: BoardsSubcommand) -> Result<(), CliError> {
    let client = app.authed()?;
    match command {
        BoardsSubcommand::List => output::print_cards(&client.whiteboards().await?),
        BoardsSubcommand::Create { title, description } => {
            let board = client.create_whiteboard(&CreateWhiteboardRequest { title, description }).await?;
            output::print_json(&board)?;
        }
        BoardsSubcommand::Show { id } => output::print_json(&client.whiteboard(id).await?)?,
        BoardsSubcommand::Update { id, title, description, data } => {
            let data = data.map(|raw| serde_json::from_str(&raw)).transpose()?;
            let board = client.update_whiteboard(id, &UpdateWhiteboardRequest { title, description, data }).await?;
            output::print_json(&board)?;
        }
        BoardsSubcommand::Delete { id, yes } => {
            if !yes {
                return Err(CliError::Usage("deleting a whiteboard cannot be undone; pass --yes".to_owned()));
            }
            client.delete_whiteboard(id).await?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

async fn run_share(app: &App, command: ShareSubcommand) -> Result<(), CliError> {
    let client = app.authed()?;
    match command {
        ShareSubcommand::List { board } => output::print_shares(&client.shares(board).await?),
        ShareSubcommand::Add { board, email, user, permission } => {
            let entry = client.share(board, &ShareRequest { user_id: user, email, permission }).await?;
            output::print_shares(std::slice::from_ref(&entry));
        }
        ShareSubcommand::Remove { board, user } => {
            client.unshare(board, user).await?;
            println!("removed {user} from {board}");
        }
        ShareSubcommand::Group(group) => match group.command {
            ShareGroupSubcommand::List { board } => output::print_group_shares(&client.group_shares(board).await?),
            ShareGroupSubcommand::Add { board, group, permission } => {
                let entry = client.share_with_group(board, &GroupShareRequest { group_id: group, permission }).await?;
                output::print_json(&entry)?;
            }
            ShareGroupSubcommand::Remove { board, group } => {
                client.unshare_group(board, group).await?;
                println!("removed group {group} from {board}");
            }
        },
    }
    Ok(())
}

async fn run_groups(app: &App, command: GroupsSubcommand) -> Result<(), CliError> {
    let client = app.authed()?;
    match command {
        GroupsSubcommand::List => output::print_groups(&client.groups().await?),
        GroupsSubcommand::Create { name, description } => {
            let group = client.create_group(&CreateGroupRequest { name, description }).await?;
            output::print_json(&group)?;
        }
        GroupsSubcommand::Members { group } => output::print_members(&client.group_members(group).await?),
        GroupsSubcommand::Add { group, user } => {
            client.add_group_member(group, user).await?;
            println!("added {user} to {group}");
        }
        GroupsSubcommand::Remove { group, user } => {
            client.remove_group_member(group, user).await?;
            println!("removed {user} from {group}");
        }
        GroupsSubcommand::Delete { group } => {
            client.delete_group(group).await?;
            println!("deleted {group}");
        }
    }
    Ok(())
}

async fn run_invites(app: &App, command: InvitesSubcommand) -> Result<(), CliError> {
    match command {
        InvitesSubcommand::Create { board, permission, ttl_hours } => {
            let invite = app.authed()?.create_invite(board, &CreateInviteRequest { permission, ttl_hours }).await?;
            output::print_invites(std::slice::from_ref(&invite));
        }
        InvitesSubcommand::List { board } => output::print_invites(&app.authed()?.invites(board).await?),
        InvitesSubcommand::Revoke { board, token } => {
            app.authed()?.revoke_invite(board, &token).await?;
            println!("revoked");
        }
        InvitesSubcommand::Open { token } => output::print_json(&app.client().open_invite(&token).await?)?,
        InvitesSubcommand::Write { token, data } => {
            let data = serde_json::from_str(&data)?;
            output::print_json(&app.client().write_through_invite(&token, data).await?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
