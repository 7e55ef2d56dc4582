//! Provisioning of the accounts the scripts send transactions from

use std::sync::Arc;

use starknet::{
    accounts::{Account, AccountFactory, OpenZeppelinAccountFactory},
    core::types::{BlockId, BlockTag, Felt},
    providers::Provider,
    signers::{LocalWallet, SigningKey},
};
use tracing::{debug, info};

use crate::{
    cli::{AccountSource, NetworkArgs},
    commands::utils::{
        parse_felt, resolve_chain_id, setup_account, setup_provider, wait_for_acceptance,
        ScriptAccount,
    },
    constants::{DEFAULT_FUNDING_AMOUNT, FEE_TOKEN_UNIT},
    devnet::DevnetClient,
    errors::ScriptError,
};

/// An account ready to send transactions, together with its private key
#[derive(Clone)]
pub struct ProvisionedAccount {
    /// The connected account
    pub account: Arc<ScriptAccount>,
    /// The private key the account signs with
    pub private_key: Felt,
}

impl ProvisionedAccount {
    /// The address of the account
    pub fn address(&self) -> Felt {
        self.account.address()
    }
}

/// Provisions the given number of accounts from the given source
pub async fn provision_accounts(
    num_accounts: usize,
    source: AccountSource,
    account_class_hash: Option<String>,
    network: &NetworkArgs,
) -> Result<Vec<ProvisionedAccount>, ScriptError> {
    let devnet = DevnetClient::new(&network.devnet_url)?;
    let chain_id = resolve_chain_id(network).await?;

    match source {
        AccountSource::Predeployed => {
            predeployed_accounts(num_accounts, &devnet, network, chain_id).await
        }
        AccountSource::Fresh => {
            let class_hash = match account_class_hash {
                Some(class_hash) => parse_felt(&class_hash)?,
                None => predeployed_account_class_hash(&devnet, network).await?,
            };

            let mut accounts = Vec::with_capacity(num_accounts);
            for _ in 0..num_accounts {
                accounts.push(create_account(class_hash, &devnet, network, chain_id).await?);
            }
            Ok(accounts)
        }
    }
}

/// Takes the first `num_accounts` of the devnet's predeployed accounts
async fn predeployed_accounts(
    num_accounts: usize,
    devnet: &DevnetClient,
    network: &NetworkArgs,
    chain_id: Felt,
) -> Result<Vec<ProvisionedAccount>, ScriptError> {
    let predeployed = devnet.predeployed_accounts().await?;
    if predeployed.len() < num_accounts {
        return Err(ScriptError::AccountCreation(format!(
            "requested {} accounts, but the devnet only has {} predeployed",
            num_accounts,
            predeployed.len()
        )));
    }

    predeployed
        .iter()
        .take(num_accounts)
        .map(|predeployed| {
            let private_key = predeployed.private_key()?;
            let account = setup_account(
                predeployed.address()?,
                SigningKey::from_secret_scalar(private_key),
                &network.rpc_url,
                chain_id,
            )?;

            Ok(ProvisionedAccount {
                account: Arc::new(account),
                private_key,
            })
        })
        .collect()
}

/// The class hash of the devnet's predeployed accounts, used as the default class for
/// freshly created accounts
async fn predeployed_account_class_hash(
    devnet: &DevnetClient,
    network: &NetworkArgs,
) -> Result<Felt, ScriptError> {
    let predeployed = devnet.predeployed_accounts().await?;
    let first = predeployed.first().ok_or_else(|| {
        ScriptError::AccountCreation("the devnet has no predeployed accounts".to_string())
    })?;

    let class_hash = setup_provider(&network.rpc_url)?
        .get_class_hash_at(BlockId::Tag(BlockTag::Latest), first.address()?)
        .await
        .map_err(|e| ScriptError::AccountCreation(e.to_string()))?;
    debug!("Using predeployed account class hash: {:#064x}", class_hash);

    Ok(class_hash)
}

/// Creates a new account: generates a key, funds the counterfactual address through the
/// devnet, and deploys the account contract.
async fn create_account(
    class_hash: Felt,
    devnet: &DevnetClient,
    network: &NetworkArgs,
    chain_id: Felt,
) -> Result<ProvisionedAccount, ScriptError> {
    let signing_key = SigningKey::from_random();
    let private_key = signing_key.secret_scalar();
    let public_key = signing_key.verifying_key().scalar();

    let factory = OpenZeppelinAccountFactory::new(
        class_hash,
        chain_id,
        LocalWallet::from(signing_key.clone()),
        setup_provider(&network.rpc_url)?,
    )
    .await
    .map_err(|e| ScriptError::AccountCreation(e.to_string()))?;

    // The public key doubles as the deployment salt
    let deployment = factory.deploy_v3(public_key);
    let address = deployment.address();

    let minted = devnet.mint(address, DEFAULT_FUNDING_AMOUNT).await?;
    debug!(
        "Funded {:#064x}, new balance: {} {}",
        address, minted.new_balance, FEE_TOKEN_UNIT
    );

    let result = deployment
        .send()
        .await
        .map_err(|e| ScriptError::AccountCreation(e.to_string()))?;
    wait_for_acceptance(factory.provider(), result.transaction_hash).await?;

    info!("Created account {:#064x}", address);
    let account = setup_account(address, signing_key, &network.rpc_url, chain_id)?;

    Ok(ProvisionedAccount {
        account: Arc::new(account),
        private_key,
    })
}
