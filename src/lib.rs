//! Snapfeed command-line front end.
//!
//! Drives the wired services headlessly: each invocation restores the cached
//! session, lets the session guard settle, runs one command and reports the
//! resulting guard snapshot.

pub mod cli;

pub use cli::{run, Cli, Command, CommandOutput};
