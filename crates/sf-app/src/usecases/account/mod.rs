//! Account settings owned by the auth service.

mod update_account;

pub use update_account::{UpdateAccount, UpdateAccountError};
