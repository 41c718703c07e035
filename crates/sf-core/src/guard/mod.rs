//! Session guard domain module.
//!
//! This module defines the session/profile/route state machine types.

pub mod state;
pub mod state_machine;

pub use state::{GuardSnapshot, GuardState, ProfileStatus};
pub use state_machine::{GuardAction, GuardEvent, GuardStateMachine, ProfileLookup, TeardownReason};
