use serde::Serialize;

use crate::auth::{Session, UserIdentity};
use crate::profile::Profile;
use crate::route::RouteDomain;

/// What the guard knows about the current user's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileStatus {
    /// Not resolved for the current session, or the last lookup was inconclusive.
    Unknown,
    /// Lookup confirmed there is no profile: onboarding is incomplete.
    Absent,
    Present(Profile),
}

impl ProfileStatus {
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Self::Present(profile) => Some(profile),
            _ => None,
        }
    }
}

/// Session guard state. Owned by the guard runtime; everyone else reads snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardState {
    pub loading: bool,
    pub session: Option<Session>,
    pub profile: ProfileStatus,
    /// Bumped whenever the session identity changes or a new lookup starts.
    /// Lookups tagged with an older generation are stale.
    pub generation: u64,
    /// Generation of the profile lookup in flight, if any.
    pub pending_lookup: Option<u64>,
}

impl Default for GuardState {
    fn default() -> Self {
        Self {
            loading: true,
            session: None,
            profile: ProfileStatus::Unknown,
            generation: 0,
            pending_lookup: None,
        }
    }
}

impl GuardState {
    /// Route domain this state must converge to, or `None` while it is not settled
    /// (initial load, lookup in flight, or profile inconclusive).
    pub fn desired_route(&self) -> Option<RouteDomain> {
        if self.loading {
            return None;
        }
        if self.session.is_none() {
            return Some(RouteDomain::Auth);
        }
        if self.pending_lookup.is_some() {
            return None;
        }
        match self.profile {
            ProfileStatus::Present(_) => Some(RouteDomain::required_for(true, true)),
            ProfileStatus::Absent => Some(RouteDomain::required_for(true, false)),
            ProfileStatus::Unknown => None,
        }
    }

    pub fn snapshot(&self) -> GuardSnapshot {
        GuardSnapshot {
            loading: self.loading,
            session: self.session.clone(),
            user: self.session.as_ref().map(|s| s.user.clone()),
            profile: self.profile.profile().cloned(),
            route: self.desired_route(),
        }
    }
}

/// Read-only view published to UI layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardSnapshot {
    pub loading: bool,
    #[serde(skip)]
    pub session: Option<Session>,
    pub user: Option<UserIdentity>,
    pub profile: Option<Profile>,
    pub route: Option<RouteDomain>,
}

impl Default for GuardSnapshot {
    fn default() -> Self {
        GuardState::default().snapshot()
    }
}

impl GuardSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}
