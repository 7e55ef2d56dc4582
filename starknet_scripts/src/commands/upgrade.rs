//! Script to upgrade the implementation behind a proxy

use std::sync::Arc;

use contracts_common::{constants::UPGRADE_FN_NAME, proxy::UpgradeOutcome};
use eyre::Result;
use starknet::{accounts::ConnectedAccount, core::types::Felt};
use tracing::{debug, info};

use crate::{
    cli::{NetworkArgs, UpgradeArgs},
    commands::utils::{artifact_paths, get_or_declare, parse_felt, setup_account_from_hex},
    contract::{Abi, ContractHandle},
    errors::ScriptError,
};

/// Attempts to point the proxy at a new implementation class, from the handle's account.
///
/// A refused or reverted upgrade is an expected outcome (the account may not be the admin),
/// so it is reported as [`UpgradeOutcome::Rejected`] rather than as an error.
pub async fn upgrade_proxy(
    proxy: &ContractHandle,
    new_implementation: Felt,
) -> Result<UpgradeOutcome, ScriptError> {
    debug!("Upgrading proxy to {:#064x}...", new_implementation);
    match proxy.invoke(UPGRADE_FN_NAME, vec![new_implementation]).await {
        Ok(transaction_hash) => {
            debug!("Upgrade accepted in {:#064x}", transaction_hash);
            Ok(UpgradeOutcome::Applied)
        }
        Err(ScriptError::TransactionRejected(reason))
        | Err(ScriptError::TransactionReverted(reason)) => {
            debug!("Upgrade rejected: {}", reason);
            Ok(UpgradeOutcome::Rejected(reason))
        }
        Err(e) => Err(e),
    }
}

/// Declares the requested implementation if needed & upgrades the proxy to it
pub async fn upgrade(args: UpgradeArgs, network: &NetworkArgs) -> Result<()> {
    let UpgradeArgs {
        address,
        private_key,
        proxy_address,
        implementation,
        class_hash,
    } = args;

    debug!("Setting up account...");
    let account = Arc::new(setup_account_from_hex(&address, &private_key, network).await?);

    let (sierra_path, casm_path) =
        artifact_paths(&network.artifacts_path, implementation.contract_name());
    let class_hash = get_or_declare(class_hash, sierra_path, casm_path, &account).await?;

    let abi = Abi::from_declared_class(account.provider(), class_hash).await?;
    let proxy = ContractHandle::new(parse_felt(&proxy_address)?, abi, account);

    match upgrade_proxy(&proxy, class_hash).await? {
        UpgradeOutcome::Applied => info!(
            "Successfully upgraded proxy {:#064x} to the {} implementation.\n\
            Implementation class hash: {:#064x}\n",
            proxy.address(),
            implementation,
            class_hash,
        ),
        UpgradeOutcome::Rejected(reason) => {
            return Err(ScriptError::TransactionRejected(format!(
                "upgrade of {:#064x} was rejected: {}",
                proxy.address(),
                reason
            ))
            .into())
        }
    }

    Ok(())
}
