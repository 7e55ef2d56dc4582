//! Definition of the CLI arguments for integration tests

use clap::Parser;
use starknet_scripts::cli::{AccountSource, NetworkArgs};

/// CLI tool for running integration tests against a running devnet node.
///
/// Assumes that the contracts have been built with `scarb build`. Every test deploys
/// its own proxy, so the tests can run against the same devnet in any order.
#[derive(Parser)]
pub(crate) struct Cli {
    /// Where to find the network & the contract artifacts
    #[command(flatten)]
    pub(crate) network: NetworkArgs,

    /// Test to run, runs all tests if omitted
    #[arg(short, long)]
    pub(crate) test: Option<String>,

    /// Where the admin & attacker accounts come from
    #[arg(long, value_enum, default_value_t = AccountSource::Predeployed)]
    pub(crate) account_source: AccountSource,
}
