//! Tests of the proxy's upgrade authorization

use contracts_common::{
    constants::{GET_VALUE_1_FN_NAME, SET_VALUE_1_FN_NAME},
    proxy::{Upgradable, UpgradeOutcome},
};
use eyre::Result;
use starknet_scripts::commands::upgrade::upgrade_proxy;

use crate::{
    assert_eq_result, assert_true_result, integration_test,
    test_inventory::TestArgs,
    utils::{assert_matches_model, deploy_proxy, observe, random_value},
};

/// An upgrade by the admin changes the behavior of `get_value_2`
async fn test_authorized_upgrade(args: TestArgs) -> Result<()> {
    let (proxy, mut model) = deploy_proxy(&args).await?;
    let (_, value_before) = observe(&proxy).await?;

    let outcome = upgrade_proxy(&proxy, args.v1_class_hash).await?;
    let predicted = model.upgrade(args.admin.address(), args.v1_class_hash);
    assert_true_result!(outcome.agrees_with(&predicted))?;
    assert_eq_result!(outcome, UpgradeOutcome::Applied)?;

    let (implementation, value_after) = observe(&proxy).await?;
    assert_eq_result!(implementation, args.v1_class_hash)?;
    assert_true_result!(value_after != value_before)
}
integration_test!(test_authorized_upgrade);

/// An upgrade by any other account is rejected & leaves the proxy unchanged
async fn test_unauthorized_upgrade(args: TestArgs) -> Result<()> {
    let (proxy, mut model) = deploy_proxy(&args).await?;
    let before = observe(&proxy).await?;

    let attacker_proxy = proxy.with_account(args.attacker.account.clone());
    let outcome = upgrade_proxy(&attacker_proxy, args.v1_class_hash).await?;
    let predicted = model.upgrade(args.attacker.address(), args.v1_class_hash);
    assert_true_result!(outcome.agrees_with(&predicted))?;
    assert_true_result!(!outcome.is_applied())?;

    assert_eq_result!(observe(&proxy).await?, before)?;
    assert_matches_model(&proxy, &model).await
}
integration_test!(test_unauthorized_upgrade);

/// An attacker cannot undo an upgrade made by the admin
async fn test_unauthorized_downgrade(args: TestArgs) -> Result<()> {
    let (proxy, mut model) = deploy_proxy(&args).await?;

    let outcome = upgrade_proxy(&proxy, args.v1_class_hash).await?;
    assert_eq_result!(outcome, UpgradeOutcome::Applied)?;
    model.upgrade(args.admin.address(), args.v1_class_hash)?;
    let upgraded = observe(&proxy).await?;

    let attacker_proxy = proxy.with_account(args.attacker.account.clone());
    let outcome = upgrade_proxy(&attacker_proxy, args.v0_class_hash).await?;
    let predicted = model.upgrade(args.attacker.address(), args.v0_class_hash);
    assert_true_result!(outcome.agrees_with(&predicted))?;

    assert_eq_result!(observe(&proxy).await?, upgraded)?;
    assert_matches_model(&proxy, &model).await
}
integration_test!(test_unauthorized_downgrade);

/// Upgrading twice to the same implementation leaves the same observable state as
/// upgrading once
async fn test_repeated_upgrade_idempotent(args: TestArgs) -> Result<()> {
    let (proxy, mut model) = deploy_proxy(&args).await?;

    let outcome = upgrade_proxy(&proxy, args.v1_class_hash).await?;
    assert_eq_result!(outcome, UpgradeOutcome::Applied)?;
    model.upgrade(args.admin.address(), args.v1_class_hash)?;
    let once = observe(&proxy).await?;

    let outcome = upgrade_proxy(&proxy, args.v1_class_hash).await?;
    assert_eq_result!(outcome, UpgradeOutcome::Applied)?;
    model.upgrade(args.admin.address(), args.v1_class_hash)?;

    assert_eq_result!(observe(&proxy).await?, once)?;
    assert_matches_model(&proxy, &model).await
}
integration_test!(test_repeated_upgrade_idempotent);

/// Storage lives in the proxy, so values written before an upgrade survive it
async fn test_storage_survives_upgrade(args: TestArgs) -> Result<()> {
    let (proxy, _) = deploy_proxy(&args).await?;
    let value = random_value();

    proxy.invoke(SET_VALUE_1_FN_NAME, vec![value]).await?;
    let outcome = upgrade_proxy(&proxy, args.v1_class_hash).await?;
    assert_eq_result!(outcome, UpgradeOutcome::Applied)?;
    let (implementation, _) = observe(&proxy).await?;
    assert_eq_result!(implementation, args.v1_class_hash)?;

    let read = proxy.call_felt(GET_VALUE_1_FN_NAME, vec![]).await?;
    assert_eq_result!(read, value)
}
integration_test!(test_storage_survives_upgrade);
