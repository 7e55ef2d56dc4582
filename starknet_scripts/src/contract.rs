//! Contract handles: an address paired with the ABI used to talk to it.
//!
//! The proxy is deployed without knowing which functions it will end up serving, so after
//! deployment its address is paired with the ABI of the implementation it delegates to.
//! Every call & invoke is checked against that ABI before any calldata goes out.

use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use starknet::{
    accounts::{Account, AccountError, ConnectedAccount},
    core::{
        types::{BlockId, BlockTag, Call, ContractClass, Felt, FunctionCall},
        utils::get_selector_from_name,
    },
    providers::{Provider, ProviderError},
};
use tracing::{debug, trace};

use crate::{
    commands::utils::{read_artifact, wait_for_acceptance, ScriptAccount, ScriptProvider},
    errors::ScriptError,
};

/// The key under which the ABI is stored in a contract class artifact
const ABI_KEY: &str = "abi";

// -------
// | ABI |
// -------

/// An entry in a contract ABI.
///
/// Only the entries needed to resolve entry points are modeled, everything else
/// (structs, enums, events, impls) is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AbiEntry {
    /// An external or view function
    Function(AbiFunction),
    /// A function invoked by L1 messages
    L1Handler(AbiFunction),
    /// A group of functions exposed through an `#[abi(embed_v0)]` impl
    Interface(AbiInterface),
    /// Any entry that does not describe a callable function
    #[serde(other)]
    Other,
}

/// A function in a contract ABI
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AbiFunction {
    /// The name of the function, from which its selector is derived
    pub name: String,
    /// The function's parameters
    #[serde(default)]
    pub inputs: Vec<AbiParameter>,
    /// The function's return types
    #[serde(default)]
    pub outputs: Vec<AbiOutput>,
    /// Whether the function may modify state
    #[serde(default, alias = "stateMutability")]
    pub state_mutability: StateMutability,
}

/// A named, typed function parameter
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AbiParameter {
    /// The name of the parameter
    pub name: String,
    /// The fully qualified Cairo type of the parameter
    #[serde(rename = "type")]
    pub ty: String,
}

/// A function return type
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AbiOutput {
    /// The fully qualified Cairo type of the output
    #[serde(rename = "type")]
    pub ty: String,
}

/// An interface grouping functions
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AbiInterface {
    /// The fully qualified name of the interface
    pub name: String,
    /// The entries of the interface
    #[serde(default)]
    pub items: Vec<AbiEntry>,
}

/// Whether a function may modify state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMutability {
    /// The function may modify state, and must be invoked
    #[default]
    External,
    /// The function only reads state, and can be called
    View,
}

impl AbiFunction {
    /// The number of felts the function's calldata serializes to, if every input
    /// is of a fixed-width type
    pub fn expected_calldata_len(&self) -> Option<usize> {
        self.inputs.iter().map(|input| felt_width(&input.ty)).sum()
    }
}

/// The number of felts a value of the given Cairo type serializes to, if it is
/// a fixed-width core type
pub fn felt_width(ty: &str) -> Option<usize> {
    match ty {
        // Cairo 0 types
        "felt" => Some(1),
        "Uint256" => Some(2),
        "core::felt252"
        | "core::bool"
        | "core::starknet::contract_address::ContractAddress"
        | "core::starknet::class_hash::ClassHash"
        | "core::starknet::eth_address::EthAddress" => Some(1),
        "core::integer::u256" | "core::integer::i256" => Some(2),
        _ => ty
            .strip_prefix("core::integer::")
            .filter(|int| {
                matches!(
                    *int,
                    "u8" | "u16" | "u32" | "u64" | "u128" | "i8" | "i16" | "i32" | "i64" | "i128"
                )
            })
            .map(|_| 1),
    }
}

/// A contract ABI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Abi {
    /// The top-level entries of the ABI
    entries: Vec<AbiEntry>,
}

impl Abi {
    /// Parses an ABI from JSON, which is either the array of entries itself, or a
    /// string containing that array (as in flattened classes).
    pub fn from_json(value: Value) -> Result<Self, ScriptError> {
        let entries = match value {
            Value::String(abi) => serde_json::from_str(&abi),
            abi => serde_json::from_value(abi),
        }
        .map_err(|e| ScriptError::Abi(e.to_string()))?;

        Ok(Self { entries })
    }

    /// Reads the ABI out of a Sierra contract class artifact
    pub fn from_artifact(path: &Path) -> Result<Self, ScriptError> {
        let mut artifact: Value = read_artifact(path)?;
        let abi = artifact
            .get_mut(ABI_KEY)
            .map(Value::take)
            .ok_or_else(|| ScriptError::Abi(format!("no ABI in {}", path.display())))?;

        Self::from_json(abi)
    }

    /// Fetches the ABI of a class declared on the network
    pub async fn from_declared_class(
        provider: &ScriptProvider,
        class_hash: Felt,
    ) -> Result<Self, ScriptError> {
        let class = provider
            .get_class(BlockId::Tag(BlockTag::Latest), class_hash)
            .await
            .map_err(|e| ScriptError::Abi(format!("class {:#064x}: {}", class_hash, e)))?;

        match class {
            ContractClass::Sierra(class) => Self::from_json(Value::String(class.abi)),
            ContractClass::Legacy(class) => Self::from_json(legacy_abi_json(class.abi)?),
        }
    }

    /// Finds a function by name, searching through interfaces
    pub fn function(&self, name: &str) -> Option<&AbiFunction> {
        self.functions().find(|function| function.name == name)
    }

    /// Iterates over every function in the ABI, including those inside interfaces.
    /// L1 handlers are excluded since they cannot be called by accounts.
    pub fn functions(&self) -> impl Iterator<Item = &AbiFunction> {
        let mut functions = Vec::new();
        collect_functions(&self.entries, &mut functions);
        functions.into_iter()
    }
}

/// Serializes a legacy class ABI back to JSON, which legacy classes may omit entirely
fn legacy_abi_json<T: Serialize>(abi: Option<T>) -> Result<Value, ScriptError> {
    let abi = abi.ok_or_else(|| ScriptError::Abi("class has no ABI".to_string()))?;
    serde_json::to_value(abi).map_err(|e| ScriptError::Abi(e.to_string()))
}

/// Recursively collects the functions in the given entries
fn collect_functions<'a>(entries: &'a [AbiEntry], functions: &mut Vec<&'a AbiFunction>) {
    for entry in entries {
        match entry {
            AbiEntry::Function(function) => functions.push(function),
            AbiEntry::Interface(interface) => collect_functions(&interface.items, functions),
            AbiEntry::L1Handler(_) | AbiEntry::Other => {}
        }
    }
}

// ----------
// | HANDLE |
// ----------

/// A deployed contract, together with its ABI & the account signing calls to it
#[derive(Clone)]
pub struct ContractHandle {
    /// The address of the contract
    address: Felt,
    /// The ABI through which the contract is used
    abi: Arc<Abi>,
    /// The account sending calls & invocations
    account: Arc<ScriptAccount>,
}

impl ContractHandle {
    /// Pairs a contract address with an ABI & an account
    pub fn new(address: Felt, abi: Abi, account: Arc<ScriptAccount>) -> Self {
        Self {
            address,
            abi: Arc::new(abi),
            account,
        }
    }

    /// The same contract & ABI, used through a different account
    pub fn with_account(&self, account: Arc<ScriptAccount>) -> Self {
        Self {
            address: self.address,
            abi: self.abi.clone(),
            account,
        }
    }

    /// The address of the contract
    pub fn address(&self) -> Felt {
        self.address
    }

    /// The ABI through which the contract is used
    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    /// The account sending calls & invocations
    pub fn account(&self) -> &ScriptAccount {
        &self.account
    }

    /// Calls a read-only entry point at the latest block, returning the raw output felts
    pub async fn call(
        &self,
        entry_point: &str,
        calldata: Vec<Felt>,
    ) -> Result<Vec<Felt>, ScriptError> {
        let selector = self.resolve(entry_point, &calldata, false /* invoke */)?;

        debug!("Calling {} on contract...", entry_point);
        let result = self
            .account
            .provider()
            .call(
                FunctionCall {
                    contract_address: self.address,
                    entry_point_selector: selector,
                    calldata,
                },
                BlockId::Tag(BlockTag::Latest),
            )
            .await
            .map_err(|e| {
                ScriptError::ContractInteraction(format!("error calling {}: {}", entry_point, e))
            })?;
        trace!("{} returned {:?}", entry_point, result);

        Ok(result)
    }

    /// Calls a read-only entry point that returns a single felt
    pub async fn call_felt(
        &self,
        entry_point: &str,
        calldata: Vec<Felt>,
    ) -> Result<Felt, ScriptError> {
        self.call(entry_point, calldata)
            .await?
            .first()
            .copied()
            .ok_or_else(|| {
                ScriptError::ContractInteraction(format!("{} returned no output", entry_point))
            })
    }

    /// Invokes a state-changing entry point from the handle's account, waiting for the
    /// transaction to be accepted. Returns the transaction hash.
    ///
    /// If the network refuses the transaction (e.g. because it fails during fee estimation)
    /// this returns [`ScriptError::TransactionRejected`], and if it is included but reverts,
    /// [`ScriptError::TransactionReverted`].
    pub async fn invoke(&self, entry_point: &str, calldata: Vec<Felt>) -> Result<Felt, ScriptError> {
        let selector = self.resolve(entry_point, &calldata, true /* invoke */)?;

        debug!("Invoking {} on contract...", entry_point);
        let result = self
            .account
            .execute_v3(vec![Call {
                to: self.address,
                selector,
                calldata,
            }])
            .send()
            .await
            .map_err(|e| match e {
                AccountError::Provider(ProviderError::StarknetError(err)) => {
                    ScriptError::TransactionRejected(format!("{}: {}", entry_point, err))
                }
                e => ScriptError::ContractInteraction(format!(
                    "error invoking {}: {}",
                    entry_point, e
                )),
            })?;
        trace!("Invoke result: {:?}", result);

        wait_for_acceptance(self.account.provider(), result.transaction_hash).await?;
        Ok(result.transaction_hash)
    }

    /// Checks the entry point against the ABI & computes its selector
    fn resolve(
        &self,
        entry_point: &str,
        calldata: &[Felt],
        invoke: bool,
    ) -> Result<Felt, ScriptError> {
        check_entry_point(&self.abi, entry_point, calldata, invoke)?;
        get_selector_from_name(entry_point)
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
    }
}

/// Checks that the ABI exposes the entry point, that it can be used the way it is being
/// used, and that the calldata has the expected length
fn check_entry_point(
    abi: &Abi,
    entry_point: &str,
    calldata: &[Felt],
    invoke: bool,
) -> Result<(), ScriptError> {
    let function = abi
        .function(entry_point)
        .ok_or_else(|| ScriptError::Abi(format!("unknown entry point `{}`", entry_point)))?;

    if invoke && function.state_mutability == StateMutability::View {
        return Err(ScriptError::Abi(format!(
            "`{}` is a view function and cannot be invoked",
            entry_point
        )));
    }

    if let Some(expected) = function.expected_calldata_len() {
        if calldata.len() != expected {
            return Err(ScriptError::CalldataConstruction(format!(
                "`{}` expects {} calldata felts, got {}",
                entry_point,
                expected,
                calldata.len()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use starknet::core::types::Felt;

    use super::{check_entry_point, felt_width, legacy_abi_json, Abi, StateMutability};
    use crate::errors::ScriptError;

    /// An ABI shaped like the one Scarb emits for the implementation contracts
    fn implementation_abi() -> Value {
        json!([
            {
                "type": "impl",
                "name": "ImplementationImpl",
                "interface_name": "upgradeable_proxy::interfaces::IImplementation"
            },
            {
                "type": "interface",
                "name": "upgradeable_proxy::interfaces::IImplementation",
                "items": [
                    {
                        "type": "function",
                        "name": "get_admin",
                        "inputs": [],
                        "outputs": [{ "type": "core::starknet::contract_address::ContractAddress" }],
                        "state_mutability": "view"
                    },
                    {
                        "type": "function",
                        "name": "upgrade",
                        "inputs": [
                            { "name": "new_implementation", "type": "core::starknet::class_hash::ClassHash" }
                        ],
                        "outputs": [],
                        "state_mutability": "external"
                    },
                    {
                        "type": "function",
                        "name": "set_value_1",
                        "inputs": [{ "name": "value", "type": "core::felt252" }],
                        "outputs": [],
                        "state_mutability": "external"
                    }
                ]
            },
            {
                "type": "event",
                "name": "upgradeable_proxy::implementation_v0::ImplementationV0::Event",
                "kind": "enum",
                "variants": []
            }
        ])
    }

    #[test]
    fn test_functions_found_inside_interfaces() {
        let abi = Abi::from_json(implementation_abi()).unwrap();

        let names: Vec<_> = abi.functions().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["get_admin", "upgrade", "set_value_1"]);

        let get_admin = abi.function("get_admin").unwrap();
        assert_eq!(get_admin.state_mutability, StateMutability::View);
        assert_eq!(get_admin.outputs.len(), 1);
        assert!(abi.function("missing").is_none());
    }

    #[test]
    fn test_abi_from_string() {
        let as_string = Value::String(implementation_abi().to_string());
        let from_string = Abi::from_json(as_string).unwrap();

        assert_eq!(from_string, Abi::from_json(implementation_abi()).unwrap());
    }

    #[test]
    fn test_abi_from_artifact() {
        let path = std::env::temp_dir().join(format!(
            "upgradeable_proxy_abi_test_{}.contract_class.json",
            std::process::id()
        ));
        let artifact = json!({ "sierra_program": [], "abi": implementation_abi() });
        std::fs::write(&path, artifact.to_string()).unwrap();

        let abi = Abi::from_artifact(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(abi.function("set_value_1").is_some());
    }

    #[test]
    fn test_legacy_class_without_abi() {
        let res = legacy_abi_json(None::<Vec<Value>>);
        assert!(matches!(res, Err(ScriptError::Abi(msg)) if msg == "class has no ABI"));

        let abi = legacy_abi_json(Some(vec![json!({
            "type": "function",
            "name": "getValue1",
            "inputs": [],
            "outputs": [],
            "stateMutability": "view"
        })]))
        .unwrap();
        assert!(Abi::from_json(abi).unwrap().function("getValue1").is_some());
    }

    #[test]
    fn test_cairo_zero_abi() {
        let abi = Abi::from_json(json!([
            {
                "type": "function",
                "name": "getValue1",
                "inputs": [],
                "outputs": [{ "name": "value", "type": "felt" }],
                "stateMutability": "view"
            },
            {
                "type": "function",
                "name": "setValue1",
                "inputs": [{ "name": "value", "type": "felt" }],
                "outputs": []
            }
        ]))
        .unwrap();

        assert_eq!(
            abi.function("getValue1").unwrap().state_mutability,
            StateMutability::View
        );
        assert_eq!(
            abi.function("setValue1").unwrap().state_mutability,
            StateMutability::External
        );
    }

    #[test]
    fn test_check_entry_point() {
        let abi = Abi::from_json(implementation_abi()).unwrap();

        check_entry_point(&abi, "get_admin", &[], false /* invoke */).unwrap();
        check_entry_point(&abi, "upgrade", &[Felt::ONE], true /* invoke */).unwrap();

        assert!(matches!(
            check_entry_point(&abi, "get_value_3", &[], false /* invoke */),
            Err(ScriptError::Abi(_))
        ));
        assert!(matches!(
            check_entry_point(&abi, "get_admin", &[], true /* invoke */),
            Err(ScriptError::Abi(_))
        ));
        assert!(matches!(
            check_entry_point(&abi, "set_value_1", &[], true /* invoke */),
            Err(ScriptError::CalldataConstruction(_))
        ));
    }

    #[test]
    fn test_felt_width() {
        assert_eq!(felt_width("core::felt252"), Some(1));
        assert_eq!(felt_width("core::integer::u64"), Some(1));
        assert_eq!(felt_width("core::integer::u256"), Some(2));
        assert_eq!(felt_width("core::integer::u512"), None);
        assert_eq!(felt_width("core::array::Array::<core::felt252>"), None);
    }
}
