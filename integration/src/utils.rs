//! Helpers shared by the integration tests

use contracts_common::{
    constants::{GET_IMPLEMENTATION_HASH_FN_NAME, GET_VALUE_2_FN_NAME},
    proxy::{ProxyState, Upgradable},
};
use eyre::Result;
use rand::{thread_rng, Rng};
use starknet::core::types::Felt;
use starknet_scripts::{
    cli::Implementation,
    commands::{deploy::setup_contracts, utils::salt_or_random},
    contract::ContractHandle,
};

use crate::{constants::MAX_TEST_VALUE, test_inventory::TestArgs};

// Local versions of the `test-helpers` assertions, whose git crate pulls in the relayer workspace

/// Returns an error unless both expressions are equal
#[macro_export]
macro_rules! assert_eq_result {
    ($left:expr, $right:expr) => {{
        let (left, right) = (&$left, &$right);
        if left == right {
            Ok(())
        } else {
            Err(eyre::eyre!(
                "assertion failed: `{} == {}`\n  left: {:?}\n right: {:?}",
                stringify!($left),
                stringify!($right),
                left,
                right
            ))
        }
    }};
}

/// Returns an error unless the expression is true
#[macro_export]
macro_rules! assert_true_result {
    ($cond:expr) => {{
        if $cond {
            Ok(())
        } else {
            Err(eyre::eyre!("assertion failed: `{}`", stringify!($cond)))
        }
    }};
}

/// Deploys a fresh proxy in front of `ImplementationV0`, administered by the admin account.
///
/// Returns the proxy handle & a reference model in the same state.
pub(crate) async fn deploy_proxy(args: &TestArgs) -> Result<(ContractHandle, ProxyState)> {
    let deployed = setup_contracts(
        args.admin.account.clone(),
        Implementation::V0,
        Some(format!("{:#x}", args.v0_class_hash)),
        Some(format!("{:#x}", args.proxy_class_hash)),
        salt_or_random(None)?,
        &args.network.artifacts_path,
    )
    .await?;

    let mut model = ProxyState::new(args.v0_class_hash);
    model.initialize(args.admin.address())?;

    Ok((deployed.proxy, model))
}

/// The observable state of a proxy: its implementation class hash & the result of
/// `get_value_2`, which differs between implementations
pub(crate) async fn observe(proxy: &ContractHandle) -> Result<(Felt, Felt)> {
    let implementation = proxy
        .call_felt(GET_IMPLEMENTATION_HASH_FN_NAME, vec![])
        .await?;
    let value_2 = proxy.call_felt(GET_VALUE_2_FN_NAME, vec![]).await?;

    Ok((implementation, value_2))
}

/// Checks that the proxy delegates to the implementation the model expects
pub(crate) async fn assert_matches_model(proxy: &ContractHandle, model: &ProxyState) -> Result<()> {
    let (implementation, _) = observe(proxy).await?;
    assert_eq_result!(implementation, model.current_implementation())
}

/// A random value to write through the proxy
pub(crate) fn random_value() -> Felt {
    Felt::from(thread_rng().gen_range(1..MAX_TEST_VALUE))
}
