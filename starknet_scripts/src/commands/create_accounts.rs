//! Script to provision funded devnet accounts

use eyre::Result;
use tracing::info;

use crate::{
    accounts::provision_accounts,
    cli::{CreateAccountsArgs, NetworkArgs},
};

/// Provisions the requested accounts & prints their credentials
pub async fn create_accounts(args: CreateAccountsArgs, network: &NetworkArgs) -> Result<()> {
    let CreateAccountsArgs {
        num_accounts,
        account_source,
        account_class_hash,
    } = args;

    let accounts =
        provision_accounts(num_accounts, account_source, account_class_hash, network).await?;

    for (i, account) in accounts.iter().enumerate() {
        info!(
            "Account #{}\n\
            Address: {:#064x}\n\
            Private key: {:#064x}\n",
            i,
            account.address(),
            account.private_key,
        );
    }

    Ok(())
}
