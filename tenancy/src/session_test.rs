use super::*;
use crate::permission::Role;
use time::OffsetDateTime;

fn user() -> SessionUser {
    SessionUser { id: Uuid::new_v4(), email: "alice@acme.com".into() }
}

fn domain() -> Domain {
    Domain {
        id: Uuid::new_v4(),
        name: "acme.com".into(),
        display_name: "Acme Corp".into(),
        logo_url: None,
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

fn profile_for(user: &SessionUser, domain_id: Uuid) -> Profile {
    Profile {
        id: user.id,
        domain_id,
        email: user.email.clone(),
        full_name: "alice".into(),
        avatar_url: None,
        role: Role::Admin,
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

fn found(user: &SessionUser, domain: Option<Domain>) -> ProfileLookup {
    let domain_id = domain.as_ref().map_or_else(Uuid::new_v4, |d| d.id);
    ProfileLookup::Found(ProfileWithDomain { profile: profile_for(user, domain_id), domain })
}

fn ready_machine() -> (SessionMachine, SessionUser) {
    let mut machine = SessionMachine::new();
    let u = user();
    machine.apply(SessionEvent::SessionResolved(Some(u.clone())));
    machine.apply(SessionEvent::ProfileResolved(found(&u, Some(domain()))));
    (machine, u)
}

// =============================================================================
// initial resolution
// =============================================================================

#[test]
fn starts_loading() {
    assert_eq!(SessionMachine::new().state(), &SessionState::Loading);
}

#[test]
fn no_user_without_domain_shows_domain_selection() {
    let mut machine = SessionMachine::new();
    assert_eq!(machine.apply(SessionEvent::SessionResolved(None)), Step::Idle);
    assert_eq!(
        machine.state(),
        &SessionState::Unauthenticated { view: UnauthenticatedView::DomainSelection }
    );
    assert_eq!(machine.state().label(), "needs-domain-selection");
}

#[test]
fn no_user_with_chosen_domain_shows_credentials() {
    let chosen = DomainSelection::Existing("acme.com".into());
    let mut machine = SessionMachine::with_selected_domain(Some(chosen.clone()));
    machine.apply(SessionEvent::SessionResolved(None));
    assert_eq!(
        machine.state(),
        &SessionState::Unauthenticated { view: UnauthenticatedView::Credentials { domain: chosen } }
    );
}

#[test]
fn user_triggers_profile_fetch() {
    let mut machine = SessionMachine::new();
    let u = user();
    assert_eq!(machine.apply(SessionEvent::SessionResolved(Some(u.clone()))), Step::FetchProfile(u.id));
    assert_eq!(machine.state(), &SessionState::Loading);
}

#[test]
fn missing_profile_needs_onboarding_never_ready() {
    let mut machine = SessionMachine::new();
    let u = user();
    machine.apply(SessionEvent::SessionResolved(Some(u.clone())));
    machine.apply(SessionEvent::ProfileResolved(ProfileLookup::Missing));
    assert_eq!(
        machine.state(),
        &SessionState::NeedsOnboarding { user: u, reason: OnboardingReason::NoProfile }
    );
    assert!(machine.ready().is_none());
}

#[test]
fn unreadable_domain_needs_onboarding() {
    let mut machine = SessionMachine::new();
    let u = user();
    machine.apply(SessionEvent::SessionResolved(Some(u.clone())));
    machine.apply(SessionEvent::ProfileResolved(found(&u, None)));
    assert!(matches!(
        machine.state(),
        SessionState::NeedsOnboarding { reason: OnboardingReason::DomainUnavailable, .. }
    ));
}

#[test]
fn profile_and_domain_make_ready() {
    let (machine, u) = ready_machine();
    let ready = machine.ready().expect("should be ready");
    assert_eq!(ready.user, u);
    assert_eq!(ready.profile.id, u.id);
    assert_eq!(ready.domain.display_name, "Acme Corp");
}

// =============================================================================
// onboarding and failures
// =============================================================================

#[test]
fn onboarding_completion_refetches_then_becomes_ready() {
    let mut machine = SessionMachine::new();
    let u = user();
    machine.apply(SessionEvent::SessionResolved(Some(u.clone())));
    machine.apply(SessionEvent::ProfileResolved(ProfileLookup::Missing));

    assert_eq!(machine.apply(SessionEvent::OnboardingCompleted), Step::FetchProfile(u.id));
    assert_eq!(machine.state().label(), "needs-onboarding");

    machine.apply(SessionEvent::ProfileResolved(found(&u, Some(domain()))));
    assert_eq!(machine.state().label(), "ready");
}

#[test]
fn onboarding_completion_without_user_is_ignored() {
    let mut machine = SessionMachine::new();
    machine.apply(SessionEvent::SessionResolved(None));
    assert_eq!(machine.apply(SessionEvent::OnboardingCompleted), Step::Idle);
}

#[test]
fn fetch_failure_keeps_prior_state_and_records_error() {
    let (mut machine, _) = ready_machine();
    let before = machine.state().clone();
    machine.apply(SessionEvent::ProfileFetchFailed("network down".into()));
    assert_eq!(machine.state(), &before);
    assert_eq!(machine.last_error(), Some("network down"));
}

#[test]
fn profile_for_other_user_is_discarded() {
    let mut machine = SessionMachine::new();
    let u = user();
    machine.apply(SessionEvent::SessionResolved(Some(u)));
    let stranger = user();
    machine.apply(SessionEvent::ProfileResolved(found(&stranger, Some(domain()))));
    assert_eq!(machine.state(), &SessionState::Loading);
}

#[test]
fn profile_after_sign_out_is_discarded() {
    let mut machine = SessionMachine::new();
    let u = user();
    machine.apply(SessionEvent::SessionResolved(Some(u.clone())));
    machine.apply(SessionEvent::SignedOut);
    machine.apply(SessionEvent::ProfileResolved(found(&u, Some(domain()))));
    assert_eq!(machine.state().label(), "needs-domain-selection");
}

// =============================================================================
// sign-out and auth changes
// =============================================================================

#[test]
fn sign_out_clears_everything() {
    let mut machine = SessionMachine::with_selected_domain(Some(DomainSelection::CreateNew));
    let u = user();
    machine.apply(SessionEvent::SessionResolved(Some(u.clone())));
    machine.apply(SessionEvent::ProfileResolved(found(&u, Some(domain()))));

    machine.apply(SessionEvent::SignedOut);
    assert!(machine.user().is_none());
    assert!(machine.selected_domain().is_none());
    assert!(machine.ready().is_none());
    assert_eq!(
        machine.state(),
        &SessionState::Unauthenticated { view: UnauthenticatedView::DomainSelection }
    );
}

#[test]
fn auth_change_rereads_profile_instead_of_trusting_cache() {
    let (mut machine, u) = ready_machine();
    assert_eq!(machine.apply(SessionEvent::AuthChanged(Some(u.clone()))), Step::FetchProfile(u.id));
    assert_eq!(machine.state(), &SessionState::Loading);

    // The profile was deleted meanwhile: the fresh answer wins.
    machine.apply(SessionEvent::ProfileResolved(ProfileLookup::Missing));
    assert_eq!(machine.state().label(), "needs-onboarding");
}

#[test]
fn auth_change_to_nobody_acts_as_sign_out() {
    let (mut machine, _) = ready_machine();
    machine.apply(SessionEvent::AuthChanged(None));
    assert!(machine.user().is_none());
    assert_eq!(machine.state().label(), "needs-domain-selection");
}

#[test]
fn domain_selection_only_applies_while_signed_out() {
    let mut machine = SessionMachine::new();
    machine.apply(SessionEvent::SessionResolved(None));
    machine.apply(SessionEvent::DomainSelected(DomainSelection::Existing("acme.com".into())));
    assert_eq!(machine.state().label(), "unauthenticated");

    machine.apply(SessionEvent::DomainCleared);
    assert_eq!(machine.state().label(), "needs-domain-selection");

    let (mut ready, _) = ready_machine();
    ready.apply(SessionEvent::DomainSelected(DomainSelection::CreateNew));
    assert_eq!(ready.state().label(), "ready");
    assert!(ready.selected_domain().is_none());
}

#[test]
fn domain_choice_while_loading_is_recorded_without_leaving_loading() {
    let mut machine = SessionMachine::new();
    let selection = DomainSelection::Existing("acme.com".into());
    machine.apply(SessionEvent::DomainSelected(selection.clone()));
    assert_eq!(machine.state(), &SessionState::Loading);
    assert_eq!(machine.selected_domain(), Some(&selection));

    machine.apply(SessionEvent::SessionResolved(None));
    assert_eq!(machine.state(), &SessionState::Unauthenticated { view: UnauthenticatedView::Credentials { domain: selection } });

    let mut cleared = SessionMachine::with_selected_domain(Some(DomainSelection::CreateNew));
    cleared.apply(SessionEvent::DomainCleared);
    assert_eq!(cleared.state(), &SessionState::Loading);
    assert!(cleared.selected_domain().is_none());
}
