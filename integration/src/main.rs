//! Integration tests for the upgradeable proxy. These assume that a devnet is already
//! running locally, and that the contracts have been built.

use clap::Parser;
use cli::Cli;
use colored::Colorize;
use constants::NUM_TEST_ACCOUNTS;
use contracts_common::constants::{
    IMPLEMENTATION_V0_CONTRACT_NAME, IMPLEMENTATION_V1_CONTRACT_NAME, PROXY_CONTRACT_NAME,
};
use eyre::{eyre, Result};
use itertools::Itertools;
use starknet::core::types::Felt;
use starknet_scripts::{
    accounts::provision_accounts,
    cli::{AccountSource, NetworkArgs},
    commands::utils::{artifact_paths, get_or_declare, ScriptAccount},
};
use test_inventory::{IntegrationTest, TestArgs};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod constants;
mod test_inventory;
mod tests;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let Cli {
        network,
        test,
        account_source,
    } = Cli::parse();

    let tests = inventory::iter::<IntegrationTest>
        .into_iter()
        .filter(|t| test.as_deref().map_or(true, |name| t.name == name))
        .sorted_by_key(|t| t.name)
        .collect_vec();
    if tests.is_empty() {
        return Err(eyre!("no test named {}", test.unwrap_or_default()));
    }

    let args = setup(network, account_source).await?;

    let mut failures = Vec::new();
    for t in tests.iter() {
        println!("Running {}...", t.name);
        match (t.test_fn)(args.clone()).await {
            Ok(()) => println!("{} {}", t.name, "PASSED".green().bold()),
            Err(e) => {
                println!("{} {}\n{:?}", t.name, "FAILED".red().bold(), e);
                failures.push(t.name);
            }
        }
    }

    println!(
        "\n{} passed, {} failed",
        (tests.len() - failures.len()).to_string().green(),
        failures.len().to_string().red()
    );
    if failures.is_empty() {
        Ok(())
    } else {
        Err(eyre!("failed tests: {}", failures.join(", ")))
    }
}

/// Provisions the admin & attacker accounts & declares every contract class the tests use
async fn setup(network: NetworkArgs, account_source: AccountSource) -> Result<TestArgs> {
    debug!("Provisioning test accounts...");
    let mut accounts =
        provision_accounts(NUM_TEST_ACCOUNTS, account_source, None, &network).await?;
    let attacker = accounts.pop().ok_or_else(|| eyre!("no attacker account"))?;
    let admin = accounts.pop().ok_or_else(|| eyre!("no admin account"))?;

    debug!("Declaring contracts...");
    let proxy_class_hash = declare(PROXY_CONTRACT_NAME, &admin.account, &network).await?;
    let v0_class_hash =
        declare(IMPLEMENTATION_V0_CONTRACT_NAME, &admin.account, &network).await?;
    let v1_class_hash =
        declare(IMPLEMENTATION_V1_CONTRACT_NAME, &admin.account, &network).await?;

    Ok(TestArgs {
        admin,
        attacker,
        proxy_class_hash,
        v0_class_hash,
        v1_class_hash,
        network,
    })
}

/// Declares the named contract, if it is not already declared
async fn declare(
    contract_name: &str,
    account: &ScriptAccount,
    network: &NetworkArgs,
) -> Result<Felt> {
    let (sierra_path, casm_path) = artifact_paths(&network.artifacts_path, contract_name);
    Ok(get_or_declare(None, sierra_path, casm_path, account).await?)
}
