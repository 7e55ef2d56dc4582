//! Script to declare an implementation & deploy the proxy in front of it

use std::sync::Arc;

use contracts_common::constants::{INITIALIZER_FN_NAME, PROXY_CONTRACT_NAME};
use eyre::Result;
use starknet::{
    accounts::{Account, ConnectedAccount},
    core::types::Felt,
};
use tracing::{debug, info};

use crate::{
    cli::{DeployArgs, Implementation, NetworkArgs},
    commands::utils::{
        artifact_paths, deploy, get_or_declare, proxy_constructor_calldata, salt_or_random,
        setup_account_from_hex, ScriptAccount,
    },
    contract::{Abi, ContractHandle},
    errors::ScriptError,
};

/// The result of bootstrapping the proxy
#[derive(Clone)]
pub struct DeployedProxy {
    /// The proxy, bound to the ABI of the implementation it delegates to
    pub proxy: ContractHandle,
    /// The class hash of the proxy contract
    pub proxy_class_hash: Felt,
    /// The class hash of the implementation the proxy was initialized with
    pub implementation_class_hash: Felt,
    /// The hash of the deployment transaction
    pub transaction_hash: Felt,
}

/// Declares the implementation & proxy classes (unless class hashes are given), then deploys
/// the proxy with the account as its admin.
///
/// The proxy constructor library-calls the implementation's initializer, so the proxy
/// is initialized by the time the deployment is accepted.
pub async fn setup_contracts(
    account: Arc<ScriptAccount>,
    implementation: Implementation,
    implementation_class_hash: Option<String>,
    proxy_class_hash: Option<String>,
    salt: Felt,
    artifacts_path: &str,
) -> Result<DeployedProxy, ScriptError> {
    debug!("Declaring {} implementation...", implementation);
    let (sierra_path, casm_path) = artifact_paths(artifacts_path, implementation.contract_name());
    let implementation_class_hash =
        get_or_declare(implementation_class_hash, sierra_path, casm_path, &account).await?;

    debug!("Declaring proxy...");
    let (sierra_path, casm_path) = artifact_paths(artifacts_path, PROXY_CONTRACT_NAME);
    let proxy_class_hash =
        get_or_declare(proxy_class_hash, sierra_path, casm_path, &account).await?;

    debug!("Deploying proxy...");
    let calldata = proxy_constructor_calldata(
        implementation_class_hash,
        INITIALIZER_FN_NAME,
        &[account.address()],
    )?;
    let (proxy_address, transaction_hash) =
        deploy(&account, proxy_class_hash, calldata, salt).await?;

    // Calls go through the proxy, but are served by the implementation
    let abi = Abi::from_declared_class(account.provider(), implementation_class_hash).await?;

    Ok(DeployedProxy {
        proxy: ContractHandle::new(proxy_address, abi, account),
        proxy_class_hash,
        implementation_class_hash,
        transaction_hash,
    })
}

/// Deploys & initializes the proxy from the account given on the command line
pub async fn deploy_and_initialize(args: DeployArgs, network: &NetworkArgs) -> Result<()> {
    let DeployArgs {
        address,
        private_key,
        implementation,
        class_hash,
        proxy_class_hash,
        salt,
    } = args;

    debug!("Setting up account...");
    let account = Arc::new(setup_account_from_hex(&address, &private_key, network).await?);
    let salt = salt_or_random(salt.as_deref())?;

    let DeployedProxy {
        proxy,
        proxy_class_hash,
        implementation_class_hash,
        transaction_hash,
    } = setup_contracts(
        account,
        implementation,
        class_hash,
        proxy_class_hash,
        salt,
        &network.artifacts_path,
    )
    .await?;

    info!(
        "Proxy contract successfully deployed & initialized!\n\
        Proxy contract address: {:#064x}\n\
        Proxy class hash: {:#064x}\n\
        Implementation ({}) class hash: {:#064x}\n\
        Admin: {:#064x}\n\
        Transaction hash: {:#064x}\n",
        proxy.address(),
        proxy_class_hash,
        implementation,
        implementation_class_hash,
        proxy.account().address(),
        transaction_hash,
    );

    Ok(())
}
