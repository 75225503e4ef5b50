//! Session resolution state machine.
//!
//! DESIGN
//! ======
//! The machine is pure: callers feed it [`SessionEvent`]s describing what the
//! backend answered and it returns the next [`Step`] the caller must perform
//! (currently only "fetch the profile for this user"). The owner of the
//! machine does the IO and feeds the result back in.
//!
//! ```text
//! Loading ──no user──────────────▶ Unauthenticated { DomainSelection | Credentials }
//!    │
//!    └─user──▶ (fetch profile) ──missing / domain unreadable──▶ NeedsOnboarding
//!                              └─profile + domain────────────▶ Ready
//! NeedsOnboarding ──onboarding completed──▶ (fetch profile) ──▶ Ready
//! any ──sign-out──▶ Unauthenticated { DomainSelection }
//! ```
//!
//! Auth change notifications always re-run profile resolution; a cached
//! profile is never carried across them.

use uuid::Uuid;

use crate::email::DomainSelection;
use crate::model::{Domain, Profile, ProfileWithDomain, SessionUser};

/// What the unauthenticated client should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthenticatedView {
    /// No workspace chosen yet in this browsing session.
    DomainSelection,
    /// Credential entry scoped to the chosen workspace.
    Credentials { domain: DomainSelection },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingReason {
    /// Authenticated, but no profile row exists yet (right after sign-up).
    NoProfile,
    /// A profile exists but its domain could not be read.
    DomainUnavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadySession {
    pub user: SessionUser,
    pub profile: Profile,
    pub domain: Domain,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    Unauthenticated { view: UnauthenticatedView },
    NeedsOnboarding { user: SessionUser, reason: OnboardingReason },
    Ready(ReadySession),
}

impl SessionState {
    /// Short name used in logs and CLI output.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Unauthenticated { view: UnauthenticatedView::DomainSelection } => "needs-domain-selection",
            Self::Unauthenticated { .. } => "unauthenticated",
            Self::NeedsOnboarding { .. } => "needs-onboarding",
            Self::Ready(_) => "ready",
        }
    }
}

/// Outcome of a profile lookup by user id.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileLookup {
    Found(ProfileWithDomain),
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Initial session fetch finished.
    SessionResolved(Option<SessionUser>),
    /// Profile lookup finished.
    ProfileResolved(ProfileLookup),
    /// Profile lookup failed at the transport/backend level.
    ProfileFetchFailed(String),
    DomainSelected(DomainSelection),
    DomainCleared,
    /// Company setup succeeded; the profile must be fetched again.
    OnboardingCompleted,
    /// Token refresh, sign-in elsewhere or external sign-out.
    AuthChanged(Option<SessionUser>),
    SignedOut,
}

/// Work the machine's owner must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Idle,
    FetchProfile(Uuid),
}

#[derive(Debug, Clone)]
pub struct SessionMachine {
    state: SessionState,
    user: Option<SessionUser>,
    selected_domain: Option<DomainSelection>,
    last_error: Option<String>,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    #[must_use]
    pub fn new() -> Self {
        Self { state: SessionState::Loading, user: None, selected_domain: None, last_error: None }
    }

    /// Start with a workspace already chosen (restored from the client's session store).
    #[must_use]
    pub fn with_selected_domain(selected: Option<DomainSelection>) -> Self {
        Self { selected_domain: selected, ..Self::new() }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn selected_domain(&self) -> Option<&DomainSelection> {
        self.selected_domain.as_ref()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn ready(&self) -> Option<&ReadySession> {
        match &self.state {
            SessionState::Ready(ready) => Some(ready),
            _ => None,
        }
    }

    /// Apply one event and return the follow-up step.
    pub fn apply(&mut self, event: SessionEvent) -> Step {
        match event {
            SessionEvent::SessionResolved(user) | SessionEvent::AuthChanged(user) => self.on_user(user),
            SessionEvent::ProfileResolved(lookup) => {
                self.on_profile(lookup);
                Step::Idle
            }
            SessionEvent::ProfileFetchFailed(message) => {
                self.last_error = Some(message);
                Step::Idle
            }
            SessionEvent::DomainSelected(selection) => {
                if self.user.is_none() {
                    self.selected_domain = Some(selection);
                    self.refresh_unauthenticated_view();
                }
                Step::Idle
            }
            SessionEvent::DomainCleared => {
                if self.user.is_none() {
                    self.selected_domain = None;
                    self.refresh_unauthenticated_view();
                }
                Step::Idle
            }
            SessionEvent::OnboardingCompleted => match &self.user {
                Some(user) => {
                    self.last_error = None;
                    Step::FetchProfile(user.id)
                }
                None => Step::Idle,
            },
            SessionEvent::SignedOut => {
                self.sign_out();
                Step::Idle
            }
        }
    }

    fn on_user(&mut self, user: Option<SessionUser>) -> Step {
        self.last_error = None;
        match user {
            Some(user) => {
                let id = user.id;
                self.user = Some(user);
                self.state = SessionState::Loading;
                Step::FetchProfile(id)
            }
            None => {
                // A session that resolves to nobody behaves like a sign-out
                // once someone was signed in; before that, keep the chosen domain.
                if self.user.take().is_some() {
                    self.selected_domain = None;
                }
                self.state = self.unauthenticated();
                Step::Idle
            }
        }
    }

    fn on_profile(&mut self, lookup: ProfileLookup) {
        let Some(user) = self.user.clone() else {
            return;
        };
        self.last_error = None;
        self.state = match lookup {
            ProfileLookup::Missing => SessionState::NeedsOnboarding { user, reason: OnboardingReason::NoProfile },
            ProfileLookup::Found(found) if found.profile.id != user.id => {
                // Answer for a previous identity; keep waiting for ours.
                return;
            }
            ProfileLookup::Found(ProfileWithDomain { domain: None, .. }) => {
                SessionState::NeedsOnboarding { user, reason: OnboardingReason::DomainUnavailable }
            }
            ProfileLookup::Found(ProfileWithDomain { profile, domain: Some(domain) }) => {
                SessionState::Ready(ReadySession { user, profile, domain })
            }
        };
    }

    fn sign_out(&mut self) {
        self.user = None;
        self.selected_domain = None;
        self.last_error = None;
        self.state = SessionState::Unauthenticated { view: UnauthenticatedView::DomainSelection };
    }

    /// Re-derive the signed-out view. While the session is still loading
    /// the selection is only recorded.
    fn refresh_unauthenticated_view(&mut self) {
        if matches!(self.state, SessionState::Unauthenticated { .. }) {
            self.state = self.unauthenticated();
        }
    }

    fn unauthenticated(&self) -> SessionState {
        let view = match &self.selected_domain {
            Some(domain) => UnauthenticatedView::Credentials { domain: domain.clone() },
            None => UnauthenticatedView::DomainSelection,
        };
        SessionState::Unauthenticated { view }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
