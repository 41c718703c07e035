//! Session guard state machine.
//!
//! Defines a pure state transition function reconciling auth state changes,
//! profile lookups and explicit sign-out. Side effects (profile lookups, teardown)
//! are returned as actions for the orchestrator to execute.

use super::state::{GuardState, ProfileStatus};
use crate::auth::{AuthChange, AuthError, AuthEventKind, Session};
use crate::ids::UserId;
use crate::profile::Profile;

/// Outcome of resolving the profile for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileLookup {
    Found(Profile),
    NotFound,
    /// The backend refused the lookup (403/401 or a session-fatal auth error).
    Unauthorized(AuthError),
    /// The auth provider no longer holds a session.
    SessionMissing,
    /// Transient failure; the profile is neither confirmed nor denied.
    Unavailable(String),
    /// The record could not be decoded.
    Malformed(String),
}

/// Events that drive the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardEvent {
    /// Initial session fetch completed.
    SessionLoaded(Option<Session>),
    /// Initial session fetch failed.
    SessionLoadFailed(AuthError),
    /// Auth provider pushed a state change.
    AuthChanged(AuthChange),
    /// A profile lookup tagged with `generation` finished.
    ProfileResolved {
        generation: u64,
        lookup: ProfileLookup,
    },
    /// The profile was created or edited elsewhere; resolve it again.
    ProfileInvalidated,
    /// User asked to sign out.
    SignOutRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownReason {
    SignedOut,
    UserDeleted,
    Unauthorized(AuthError),
    SessionMissing,
    SignOutRequested,
}

impl TeardownReason {
    /// Whether the remote session must be revoked as part of the teardown.
    ///
    /// Provider-initiated sign-outs already ended the remote session.
    pub fn revokes_remote(&self) -> bool {
        !matches!(self, Self::SignedOut | Self::UserDeleted)
    }
}

/// Side-effects produced by guard transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardAction {
    /// Resolve the profile for `user_id`; report back tagged with `generation`.
    LookupProfile { generation: u64, user_id: UserId },
    /// Clear client-held credentials (and revoke remotely when the reason requires it).
    TearDown { reason: TeardownReason },
}

/// Pure guard state machine: no side effects.
pub struct GuardStateMachine;

impl GuardStateMachine {
    pub fn transition(state: GuardState, event: GuardEvent) -> (GuardState, Vec<GuardAction>) {
        match event {
            GuardEvent::SessionLoaded(Some(session)) => Self::begin_lookup(state, session),
            GuardEvent::SessionLoaded(None) => (Self::cleared(state), Vec::new()),
            GuardEvent::SessionLoadFailed(error) => {
                if error.is_session_fatal() {
                    Self::tear_down(state, TeardownReason::Unauthorized(error))
                } else {
                    // Fail closed: an unreachable provider means no session.
                    (Self::cleared(state), Vec::new())
                }
            }
            GuardEvent::AuthChanged(change) => Self::on_auth_change(state, change),
            GuardEvent::ProfileResolved { generation, lookup } => {
                Self::on_profile_resolved(state, generation, lookup)
            }
            GuardEvent::ProfileInvalidated => match state.session.clone() {
                Some(session) => Self::begin_lookup(state, session),
                None => (state, Vec::new()),
            },
            GuardEvent::SignOutRequested => {
                Self::tear_down(state, TeardownReason::SignOutRequested)
            }
        }
    }

    fn on_auth_change(state: GuardState, change: AuthChange) -> (GuardState, Vec<GuardAction>) {
        let AuthChange { kind, session } = change;

        if kind.ends_session() {
            if state.session.is_none() {
                let mut state = state;
                state.loading = false;
                return (state, Vec::new());
            }
            let reason = match kind {
                AuthEventKind::UserDeleted => TeardownReason::UserDeleted,
                _ => TeardownReason::SignedOut,
            };
            return Self::tear_down(state, reason);
        }

        match session {
            None => (Self::cleared(state), Vec::new()),
            Some(session) => {
                let same_user = state
                    .session
                    .as_ref()
                    .is_some_and(|current| current.same_user(&session));
                if kind == AuthEventKind::TokenRefreshed && same_user {
                    // Bookkeeping only: new tokens, same identity, lookups stay valid.
                    let mut state = state;
                    state.session = Some(session);
                    return (state, Vec::new());
                }
                Self::begin_lookup(state, session)
            }
        }
    }

    fn on_profile_resolved(
        state: GuardState,
        generation: u64,
        lookup: ProfileLookup,
    ) -> (GuardState, Vec<GuardAction>) {
        if state.pending_lookup != Some(generation) {
            return (state, Vec::new());
        }

        let mut state = state;
        state.pending_lookup = None;
        state.loading = false;

        match lookup {
            ProfileLookup::Found(profile) => {
                let owned = state
                    .session
                    .as_ref()
                    .is_some_and(|s| s.user_id() == &profile.id);
                // A row for someone else is malformed data: never grant MAIN on it.
                state.profile = if owned {
                    ProfileStatus::Present(profile)
                } else {
                    ProfileStatus::Absent
                };
                (state, Vec::new())
            }
            ProfileLookup::NotFound | ProfileLookup::Malformed(_) => {
                state.profile = ProfileStatus::Absent;
                (state, Vec::new())
            }
            ProfileLookup::Unauthorized(error) => {
                Self::tear_down(state, TeardownReason::Unauthorized(error))
            }
            ProfileLookup::SessionMissing => {
                Self::tear_down(state, TeardownReason::SessionMissing)
            }
            ProfileLookup::Unavailable(_) => (state, Vec::new()),
        }
    }

    fn begin_lookup(state: GuardState, session: Session) -> (GuardState, Vec<GuardAction>) {
        let mut state = state;
        let same_user = state
            .session
            .as_ref()
            .is_some_and(|current| current.same_user(&session));
        if !same_user {
            state.profile = ProfileStatus::Unknown;
        }
        let user_id = session.user_id().clone();
        state.session = Some(session);
        state.generation += 1;
        state.pending_lookup = Some(state.generation);

        let generation = state.generation;
        (state, vec![GuardAction::LookupProfile { generation, user_id }])
    }

    fn cleared(state: GuardState) -> GuardState {
        let mut state = state;
        if state.session.is_some() || state.pending_lookup.is_some() {
            state.generation += 1;
        }
        state.session = None;
        state.profile = ProfileStatus::Unknown;
        state.pending_lookup = None;
        state.loading = false;
        state
    }

    fn tear_down(state: GuardState, reason: TeardownReason) -> (GuardState, Vec<GuardAction>) {
        let mut state = Self::cleared(state);
        state.generation += 1;
        (state, vec![GuardAction::TearDown { reason }])
    }
}
