//! Owns the process-wide session state machine and performs its IO.
//!
//! The controller is created once at startup from the persisted session,
//! feeds the machine every backend answer, and runs whatever follow-up step
//! the machine asks for. Backend access goes through [`SessionBackend`] so
//! the flow can be exercised without a server.

use tenancy::email::DomainSelection;
use tenancy::session::{ProfileLookup, SessionEvent, SessionMachine, SessionState, Step};
use tenancy::SessionUser;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::error::CliError;

#[async_trait::async_trait]
pub trait SessionBackend: Send + Sync {
    /// The user behind the current credentials, if any.
    async fn current_user(&self) -> Result<Option<SessionUser>, CliError>;

    /// The profile (with domain) of `user_id`.
    async fn lookup_profile(&self, user_id: Uuid) -> Result<ProfileLookup, CliError>;
}

#[async_trait::async_trait]
impl SessionBackend for ApiClient {
    async fn current_user(&self) -> Result<Option<SessionUser>, CliError> {
        Ok(self.session().await?.map(|info| info.user))
    }

    async fn lookup_profile(&self, _user_id: Uuid) -> Result<ProfileLookup, CliError> {
        // The endpoint answers for the session's own user.
        match self.profile().await {
            Ok(found) => Ok(ProfileLookup::Found(found)),
            Err(e) if e.is_profile_missing() => Ok(ProfileLookup::Missing),
            Err(e) => Err(e),
        }
    }
}

pub struct SessionController<B> {
    machine: SessionMachine,
    backend: B,
}

impl<B: SessionBackend> SessionController<B> {
    #[must_use]
    pub fn new(backend: B, selected_domain: Option<DomainSelection>) -> Self {
        Self { machine: SessionMachine::with_selected_domain(selected_domain), backend }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[must_use]
    pub fn machine(&self) -> &SessionMachine {
        &self.machine
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        self.machine.state()
    }

    async fn run(&mut self, mut step: Step) -> Result<(), CliError> {
        while let Step::FetchProfile(user_id) = step {
            step = match self.backend.lookup_profile(user_id).await {
                Ok(lookup) => self.machine.apply(SessionEvent::ProfileResolved(lookup)),
                Err(e) => {
                    self.machine.apply(SessionEvent::ProfileFetchFailed(e.to_string()));
                    return Err(e);
                }
            };
        }
        Ok(())
    }

    /// Initial resolution: who is signed in, then their profile.
    ///
    /// # Errors
    ///
    /// Transport failures; the machine stays where it was.
    pub async fn resolve(&mut self) -> Result<&SessionState, CliError> {
        let user = self.backend.current_user().await?;
        let step = self.machine.apply(SessionEvent::SessionResolved(user));
        self.run(step).await?;
        Ok(self.machine.state())
    }

    /// Credentials changed (sign-in, sign-up). Profile resolution re-runs.
    ///
    /// # Errors
    ///
    /// Transport failures during the profile fetch.
    pub async fn auth_changed(&mut self, user: Option<SessionUser>) -> Result<&SessionState, CliError> {
        let step = self.machine.apply(SessionEvent::AuthChanged(user));
        self.run(step).await?;
        Ok(self.machine.state())
    }

    /// Company setup succeeded; fetch the fresh profile.
    ///
    /// # Errors
    ///
    /// Transport failures during the profile fetch.
    pub async fn onboarding_completed(&mut self) -> Result<&SessionState, CliError> {
        let step = self.machine.apply(SessionEvent::OnboardingCompleted);
        self.run(step).await?;
        Ok(self.machine.state())
    }

    pub fn select_domain(&mut self, selection: DomainSelection) -> &SessionState {
        self.machine.apply(SessionEvent::DomainSelected(selection));
        self.machine.state()
    }

    pub fn clear_domain(&mut self) -> &SessionState {
        self.machine.apply(SessionEvent::DomainCleared);
        self.machine.state()
    }

    pub fn signed_out(&mut self) -> &SessionState {
        self.machine.apply(SessionEvent::SignedOut);
        self.machine.state()
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
