//! Implementations of the script subcommands

pub mod create_accounts;
pub mod demo;
pub mod deploy;
pub mod upgrade;
pub mod utils;
