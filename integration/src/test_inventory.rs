//! Defines types and utilities for managing the inventory of integration tests

use eyre::Result;
use starknet::core::types::Felt;
use starknet_scripts::{accounts::ProvisionedAccount, cli::NetworkArgs};
use std::{future::Future, pin::Pin};

/// The arguments provided to each integration test
#[derive(Clone)]
pub struct TestArgs {
    /// The account every proxy deployed in the tests is administered by
    pub admin: ProvisionedAccount,
    /// An account with no rights over any proxy
    pub attacker: ProvisionedAccount,
    /// The class hash of the proxy contract
    pub proxy_class_hash: Felt,
    /// The class hash of `ImplementationV0`
    pub v0_class_hash: Felt,
    /// The class hash of `ImplementationV1`
    pub v1_class_hash: Felt,
    /// Where to find the network & the contract artifacts
    pub network: NetworkArgs,
}

/// The signature of an integration test
type TestFn = fn(TestArgs) -> Pin<Box<dyn Future<Output = Result<()>>>>;

/// A struct representing an integration test
pub struct IntegrationTest {
    /// The name of the test
    pub name: &'static str,
    /// The test function
    pub test_fn: TestFn,
}

// Collect the integration tests into an iterable
inventory::collect!(IntegrationTest);

/// Macro to register an integration test
#[macro_export]
macro_rules! integration_test {
    ($test_fn:ident) => {
        inventory::submit!($crate::test_inventory::IntegrationTest {
            name: stringify!($test_fn),
            test_fn: move |args| std::boxed::Box::pin($test_fn(args)),
        });
    };
}
