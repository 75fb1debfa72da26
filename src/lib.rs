//! Device code sign-in against the Microsoft identity platform, followed by
//! streaming enumeration of tenants, subscriptions and key vaults through
//! Azure Resource Manager.

pub mod arm;
pub mod cmd;
pub mod config;
pub mod error;

pub use error::{Result, VaultScoutError};
