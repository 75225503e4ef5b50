//! Terminal rendering for command results.

use serde::Serialize;
use tenancy::display::{avatar_stack, initials, member_count_label, updated_label};
use tenancy::session::{OnboardingReason, SessionMachine, SessionState, UnauthenticatedView};
use tenancy::{GroupShareEntry, GroupSummary, InviteToken, MemberSummary, ShareEntry, WhiteboardCard};
use time::OffsetDateTime;

use crate::error::CliError;

/// Collaborator avatars drawn on a card before collapsing into `+N`.
const MAX_CARD_AVATARS: usize = 3;

pub fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_session(machine: &SessionMachine) {
    println!("state: {}", machine.state().label());
    match machine.state() {
        SessionState::Loading => {}
        SessionState::Unauthenticated { view: UnauthenticatedView::DomainSelection } => {
            println!("next: choose a workspace with `boardspace domain select <name>` or `boardspace domain new`");
        }
        SessionState::Unauthenticated { view: UnauthenticatedView::Credentials { domain } } => {
            match domain.slug() {
                Some(slug) => println!("workspace: {slug}"),
                None => println!("workspace: (new)"),
            }
            println!("next: `boardspace signin` or `boardspace signup`");
        }
        SessionState::NeedsOnboarding { user, reason } => {
            println!("user: {}", user.email);
            match reason {
                OnboardingReason::NoProfile => println!("no profile yet"),
                OnboardingReason::DomainUnavailable => println!("workspace could not be loaded"),
            }
            println!("next: `boardspace onboard --company <name>`");
        }
        SessionState::Ready(ready) => {
            println!("user: {} <{}>", ready.profile.full_name, ready.user.email);
            println!("role: {}", ready.profile.role);
            println!("workspace: {} ({})", ready.domain.display_name, ready.domain.name);
        }
    }
    if let Some(error) = machine.last_error() {
        println!("last error: {error}");
    }
}

fn member_line(member: &MemberSummary) -> String {
    format!("[{}] {} <{}>  {}", initials(&member.full_name), member.full_name, member.email, member.id)
}

pub fn print_members(members: &[MemberSummary]) {
    if members.is_empty() {
        println!("(no members)");
    }
    for member in members {
        println!("{}", member_line(member));
    }
}

pub(crate) fn card_lines(card: &WhiteboardCard, now: OffsetDateTime) -> Vec<String> {
    let board = &card.whiteboard;
    let owner = card.owner.as_ref().map_or("unknown", |o| o.full_name.as_str());
    let (shown, overflow) = avatar_stack(&card.collaborators, MAX_CARD_AVATARS);
    let mut avatars: Vec<String> = shown.iter().map(|m| initials(&m.full_name)).collect();
    if overflow > 0 {
        avatars.push(format!("+{overflow}"));
    }

    let mut lines = vec![format!("{}  {}  [{}]", board.id, board.title, card.access.label())];
    if !board.description.is_empty() {
        lines.push(format!("    {}", board.description));
    }
    lines.push(format!("    owner: {owner}  updated: {}", updated_label(now, board.updated_at)));
    if !avatars.is_empty() {
        lines.push(format!("    shared with: {}", avatars.join(" ")));
    }
    lines
}

pub fn print_cards(cards: &[WhiteboardCard]) {
    if cards.is_empty() {
        println!("(no whiteboards)");
        return;
    }
    let now = OffsetDateTime::now_utc();
    for card in cards {
        for line in card_lines(card, now) {
            println!("{line}");
        }
    }
}

pub fn print_shares(shares: &[ShareEntry]) {
    if shares.is_empty() {
        println!("(not shared with any member)");
    }
    for share in shares {
        println!("{:<10} {} <{}>  {}", share.permission, share.full_name, share.email, share.user_id);
    }
}

pub fn print_group_shares(shares: &[GroupShareEntry]) {
    if shares.is_empty() {
        println!("(not shared with any group)");
    }
    for share in shares {
        println!("{:<10} {} ({})  {}", share.permission, share.name, member_count_label(share.member_count), share.group_id);
    }
}

pub fn print_groups(groups: &[GroupSummary]) {
    if groups.is_empty() {
        println!("(no groups)");
    }
    for summary in groups {
        let group = &summary.group;
        println!("{}  {} ({})", group.id, group.name, member_count_label(summary.member_count));
        if !group.description.is_empty() {
            println!("    {}", group.description);
        }
    }
}

pub fn print_invites(invites: &[InviteToken]) {
    if invites.is_empty() {
        println!("(no active invites)");
    }
    for invite in invites {
        let expires = invite
            .expires_at
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| invite.expires_at.to_string());
        println!("{:<10} {}  expires {expires}", invite.permission, invite.token);
    }
}

#[cfg(test)]
#[path = "output_test.rs"]
mod tests;
