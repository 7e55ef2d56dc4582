//! The proxy walkthrough: deploy, use & upgrade the proxy, then check that an attacker
//! cannot upgrade it.
//!
//! An off-chain [`ProxyState`] is kept next to the deployed proxy, and every upgrade attempt
//! is checked against what the model predicts.

use contracts_common::{
    constants::{
        GET_ADMIN_FN_NAME, GET_IMPLEMENTATION_HASH_FN_NAME, GET_VALUE_1_FN_NAME,
        GET_VALUE_2_FN_NAME, SET_VALUE_1_FN_NAME,
    },
    proxy::{ProxyError, ProxyState, Upgradable, UpgradeOutcome},
};
use eyre::Result;
use starknet::core::types::Felt;
use tracing::{debug, info};

use crate::{
    accounts::provision_accounts,
    cli::{DemoArgs, Implementation, NetworkArgs},
    commands::{
        deploy::{setup_contracts, DeployedProxy},
        upgrade::upgrade_proxy,
        utils::{artifact_paths, ensure, get_or_declare, salt_or_random, ScriptAccount},
    },
    constants::NUM_DEMO_ACCOUNTS,
    errors::ScriptError,
};

/// Runs the walkthrough
pub async fn demo(args: DemoArgs, network: &NetworkArgs) -> Result<()> {
    let DemoArgs {
        account_source,
        account_class_hash,
        value,
        salt,
    } = args;

    // --- Accounts --- //

    debug!("Provisioning admin & attacker accounts...");
    let accounts =
        provision_accounts(NUM_DEMO_ACCOUNTS, account_source, account_class_hash, network).await?;
    let [admin, attacker] = <[_; NUM_DEMO_ACCOUNTS]>::try_from(accounts).map_err(|accounts| {
        ScriptError::AccountCreation(format!(
            "expected {} accounts, got {}",
            NUM_DEMO_ACCOUNTS,
            accounts.len()
        ))
    })?;

    // --- Bootstrap --- //

    let salt = salt_or_random(salt.as_deref())?;
    let DeployedProxy {
        proxy,
        implementation_class_hash: v0_class_hash,
        ..
    } = setup_contracts(
        admin.account.clone(),
        Implementation::V0,
        None, /* implementation_class_hash */
        None, /* proxy_class_hash */
        salt,
        &network.artifacts_path,
    )
    .await?;
    debug!("Proxy deployed at {:#064x}", proxy.address());

    let mut model = ProxyState::new(v0_class_hash);
    model.initialize(admin.address()).map_err(model_error)?;

    // --- Interaction --- //

    let proxy_admin = proxy.call_felt(GET_ADMIN_FN_NAME, vec![]).await?;
    ensure(
        proxy_admin == admin.address(),
        format!(
            "proxy admin is {:#064x}, expected {:#064x}",
            proxy_admin,
            admin.address()
        ),
    )?;
    info!("The proxy admin was set to our account: {:#064x}", proxy_admin);

    let value_target = Felt::from(value);
    proxy.invoke(SET_VALUE_1_FN_NAME, vec![value_target]).await?;
    let value_1 = proxy.call_felt(GET_VALUE_1_FN_NAME, vec![]).await?;
    ensure(
        value_1 == value_target,
        format!("read back {} after writing {}", value_1, value_target),
    )?;
    info!("The proxy works!");

    // --- Authorized upgrade --- //

    let old_value = proxy.call_felt(GET_VALUE_2_FN_NAME, vec![]).await?;
    let v1_class_hash =
        declare_implementation(Implementation::V1, &admin.account, network).await?;

    let outcome = upgrade_proxy(&proxy, v1_class_hash).await?;
    let predicted = model.upgrade(admin.address(), v1_class_hash);
    check_outcome(&outcome, &predicted)?;

    let new_value = proxy.call_felt(GET_VALUE_2_FN_NAME, vec![]).await?;
    ensure(
        new_value != old_value,
        format!("{} returned {} before & after upgrading", GET_VALUE_2_FN_NAME, new_value),
    )?;
    info!("And so does upgrading!");

    // --- Unauthorized upgrade --- //

    // The attacker declares v0 themselves, which is a no-op since it is already declared
    let evil_class_hash =
        declare_implementation(Implementation::V0, &attacker.account, network).await?;

    let evil_proxy = proxy.with_account(attacker.account.clone());
    let outcome = upgrade_proxy(&evil_proxy, evil_class_hash).await?;
    let predicted = model.upgrade(attacker.address(), evil_class_hash);
    check_outcome(&outcome, &predicted)?;
    debug!("Attacker upgrade outcome: {}", outcome);

    let same_value = proxy.call_felt(GET_VALUE_2_FN_NAME, vec![]).await?;
    ensure(
        same_value == new_value,
        format!("value changed from {} to {}", new_value, same_value),
    )?;

    let implementation_hash = proxy
        .call_felt(GET_IMPLEMENTATION_HASH_FN_NAME, vec![])
        .await?;
    ensure(
        implementation_hash == model.current_implementation(),
        format!(
            "proxy delegates to {:#064x}, expected {:#064x}",
            implementation_hash,
            model.current_implementation()
        ),
    )?;
    info!(
        "Evil couldn't upgrade the contract. The value is still {}.",
        same_value
    );

    Ok(())
}

/// Declares (or looks up) an implementation class from the given account
async fn declare_implementation(
    implementation: Implementation,
    account: &ScriptAccount,
    network: &NetworkArgs,
) -> Result<Felt, ScriptError> {
    let (sierra_path, casm_path) =
        artifact_paths(&network.artifacts_path, implementation.contract_name());
    get_or_declare(None, sierra_path, casm_path, account).await
}

/// Checks that an on-chain upgrade outcome matches the model's prediction
fn check_outcome(
    outcome: &UpgradeOutcome,
    predicted: &Result<(), ProxyError>,
) -> Result<(), ScriptError> {
    let predicted_str = match predicted {
        Ok(()) => "applied".to_string(),
        Err(e) => format!("rejected ({})", e),
    };

    ensure(
        outcome.agrees_with(predicted),
        format!("on-chain upgrade was {}, expected {}", outcome, predicted_str),
    )
}

/// Converts a reference model error into a failed check
fn model_error(e: ProxyError) -> ScriptError {
    ScriptError::CheckFailed(e.to_string())
}
