//! Command line interface for the Starknet scripts

use std::fmt::{self, Display};

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts_common::constants::{
    IMPLEMENTATION_V0_CONTRACT_NAME, IMPLEMENTATION_V1_CONTRACT_NAME,
};

use crate::constants::{
    DEFAULT_ARTIFACTS_PATH, DEFAULT_DEMO_VALUE, DEFAULT_DEVNET_URL, DEFAULT_RPC_URL,
};

/// Scripts for deploying, exercising & upgrading the upgradeable proxy contracts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(flatten)]
    /// Where to find the network & the contract artifacts
    pub network: NetworkArgs,

    #[command(subcommand)]
    /// The script to run
    pub command: Commands,
}

/// The available scripts
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs the full proxy walkthrough against a devnet:
    /// provisions an admin & an attacker account, deploys the proxy,
    /// exercises it, upgrades it, and checks that the attacker cannot upgrade it.
    Demo(DemoArgs),

    /// Declares the proxy & an implementation, then deploys & initializes the proxy
    /// with the given account as its admin.
    Deploy(DeployArgs),

    /// Upgrades the implementation behind a proxy.
    /// This includes declaring the implementation, if it is not already declared.
    Upgrade(UpgradeArgs),

    /// Creates funded accounts on a devnet and prints their addresses & keys.
    CreateAccounts(CreateAccountsArgs),
}

/// Arguments shared by every command
#[derive(Args, Debug, Clone)]
pub struct NetworkArgs {
    #[arg(long, env = "STARKNET_RPC_URL", default_value = DEFAULT_RPC_URL, global = true)]
    /// The JSON-RPC endpoint of the Starknet node
    pub rpc_url: String,

    #[arg(long, env = "DEVNET_URL", default_value = DEFAULT_DEVNET_URL, global = true)]
    /// The base URL of the devnet, used for minting & listing predeployed accounts
    pub devnet_url: String,

    #[arg(long, env = "STARKNET_CHAIN_ID", global = true)]
    /// The chain ID as a Cairo short string, e.g. `SN_SEPOLIA`.
    /// If omitted, it is fetched from the node.
    pub chain_id: Option<String>,

    #[arg(long, env = "ARTIFACTS_PATH", default_value = DEFAULT_ARTIFACTS_PATH, global = true)]
    /// The path to a folder containing the Sierra & casm artifacts of the contracts.
    /// The files in this folder should be named:
    /// upgradeable_proxy_{Proxy, ImplementationV0, ImplementationV1}.{contract_class, compiled_contract_class}.json
    pub artifacts_path: String,
}

/// Arguments for the demo walkthrough
#[derive(Args, Debug)]
pub struct DemoArgs {
    #[arg(long, value_enum, default_value_t = AccountSource::Fresh)]
    /// Where the admin & attacker accounts come from
    pub account_source: AccountSource,

    #[arg(long)]
    /// The class hash of the account contract to deploy fresh accounts with, in hex form.
    /// Defaults to the class of the devnet's predeployed accounts.
    pub account_class_hash: Option<String>,

    #[arg(long, default_value_t = DEFAULT_DEMO_VALUE)]
    /// The value to write & read back through the proxy
    pub value: u64,

    #[arg(long)]
    /// The salt with which to deploy the proxy, in hex form. Random if omitted.
    pub salt: Option<String>,
}

/// Arguments for deploying the proxy
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[arg(short, long, env = "ACCOUNT_ADDRESS")]
    /// The account address of the proxy admin, which will be able to upgrade the proxy.
    /// Assumes this is the same address as the one associated with the private key.
    pub address: String,

    #[arg(short, long, env = "PRIVATE_KEY")]
    /// The private key of the account from which to send the transactions, in hex form.
    pub private_key: String,

    #[arg(short, long, value_enum, default_value_t = Implementation::V0)]
    /// The implementation to initialize the proxy with
    pub implementation: Implementation,

    #[arg(long)]
    /// The class hash of an already-declared implementation, in hex form.
    /// Skips declaring the implementation.
    pub class_hash: Option<String>,

    #[arg(long)]
    /// The class hash of an already-declared proxy, in hex form.
    /// Skips declaring the proxy.
    pub proxy_class_hash: Option<String>,

    #[arg(long)]
    /// The salt with which to deploy the proxy, in hex form. Random if omitted.
    pub salt: Option<String>,
}

/// Arguments for upgrading the proxy
#[derive(Args, Debug)]
pub struct UpgradeArgs {
    #[arg(short, long, env = "ACCOUNT_ADDRESS")]
    /// The account address associated with the private key.
    pub address: String,

    #[arg(short, long, env = "PRIVATE_KEY")]
    /// The private key of the account from which to send the transactions, in hex form.
    pub private_key: String,

    #[arg(long)]
    /// The address of the proxy contract.
    pub proxy_address: String,

    #[arg(short, long, value_enum, default_value_t = Implementation::V1)]
    /// The implementation to upgrade to
    pub implementation: Implementation,

    #[arg(long)]
    /// The class hash of an already-declared implementation, in hex form.
    /// Skips declaring the implementation.
    pub class_hash: Option<String>,
}

/// Arguments for creating devnet accounts
#[derive(Args, Debug)]
pub struct CreateAccountsArgs {
    #[arg(short, long, default_value_t = 1)]
    /// How many accounts to create
    pub num_accounts: usize,

    #[arg(long, value_enum, default_value_t = AccountSource::Fresh)]
    /// Where the accounts come from
    pub account_source: AccountSource,

    #[arg(long)]
    /// The class hash of the account contract to deploy fresh accounts with, in hex form.
    pub account_class_hash: Option<String>,
}

/// Where script accounts come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AccountSource {
    /// Generate a key, fund the address through the devnet & deploy the account
    Fresh,
    /// Reuse the accounts the devnet was started with
    Predeployed,
}

/// The implementation contracts the proxy can delegate to
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Implementation {
    /// `ImplementationV0`, whose `get_value_2` returns the stored value
    V0,
    /// `ImplementationV1`, whose `get_value_2` returns the stored value plus one
    V1,
}

impl Implementation {
    /// The name of the contract in the Scarb package
    pub fn contract_name(&self) -> &'static str {
        match self {
            Implementation::V0 => IMPLEMENTATION_V0_CONTRACT_NAME,
            Implementation::V1 => IMPLEMENTATION_V1_CONTRACT_NAME,
        }
    }
}

impl Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Implementation::V0 => write!(f, "v0"),
            Implementation::V1 => write!(f, "v1"),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{AccountSource, CliArgs, Commands, Implementation};
    use crate::constants::DEFAULT_DEMO_VALUE;

    #[test]
    fn test_demo_defaults() {
        // Network args may come from the environment, so only the demo args are checked
        let args = CliArgs::try_parse_from(["starknet-scripts", "demo"]).unwrap();

        match args.command {
            Commands::Demo(demo) => {
                assert!(demo.account_class_hash.is_none());
                assert_eq!(demo.account_source, AccountSource::Fresh);
                assert_eq!(demo.value, DEFAULT_DEMO_VALUE);
                assert!(demo.salt.is_none());
            }
            _ => panic!("expected the demo command"),
        }
    }

    #[test]
    fn test_global_network_args_after_subcommand() {
        let args = CliArgs::try_parse_from([
            "starknet-scripts",
            "upgrade",
            "--address",
            "0x1",
            "--private-key",
            "0x2",
            "--proxy-address",
            "0x3",
            "--rpc-url",
            "http://127.0.0.1:5051/rpc",
        ])
        .unwrap();

        assert_eq!(args.network.rpc_url, "http://127.0.0.1:5051/rpc");
        match args.command {
            Commands::Upgrade(upgrade) => {
                assert_eq!(upgrade.implementation, Implementation::V1);
                assert_eq!(upgrade.proxy_address, "0x3");
            }
            _ => panic!("expected the upgrade command"),
        }
    }

    #[test]
    fn test_implementation_contract_names() {
        assert_eq!(Implementation::V0.contract_name(), "ImplementationV0");
        assert_eq!(Implementation::V1.contract_name(), "ImplementationV1");
    }
}
