//! Helpers shared across the scripts: account setup, declaration, deployment & receipt polling

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use contracts_common::constants::PACKAGE_NAME;
use rand::{thread_rng, Rng};
use serde::de::DeserializeOwned;
use starknet::{
    accounts::{Account, ConnectedAccount, ExecutionEncoding, SingleOwnerAccount},
    contract::ContractFactory,
    core::{
        types::{
            contract::{CompiledClass, SierraClass},
            BlockId, BlockTag, ExecutionResult, Felt, InvokeTransactionResult, StarknetError,
            TransactionReceiptWithBlockInfo,
        },
        utils::{
            cairo_short_string_to_felt, get_selector_from_name, get_udc_deployed_address,
            UdcUniqueness,
        },
    },
    providers::{jsonrpc::HttpTransport, JsonRpcClient, Provider, ProviderError},
    signers::{LocalWallet, SigningKey},
};
use tokio::time::sleep;
use tracing::{debug, trace};
use url::Url;

use crate::{
    cli::NetworkArgs,
    constants::{
        CASM_FILE_EXTENSION, NUM_BYTES_FELT, SIERRA_FILE_EXTENSION, TX_POLL_INTERVAL_MS,
        TX_TIMEOUT_SECS,
    },
    errors::ScriptError,
};

/// The JSON-RPC provider used by the scripts
pub type ScriptProvider = JsonRpcClient<HttpTransport>;

/// An account signing with a local private key, connected over JSON-RPC
pub type ScriptAccount = SingleOwnerAccount<ScriptProvider, LocalWallet>;

// ---------------------
// | ACCOUNTS & CLIENT |
// ---------------------

/// Connects a JSON-RPC provider to the given endpoint
pub fn setup_provider(rpc_url: &str) -> Result<ScriptProvider, ScriptError> {
    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    Ok(JsonRpcClient::new(HttpTransport::new(url)))
}

/// Resolves the chain ID, preferring an explicitly configured one over asking the node
pub async fn resolve_chain_id(network: &NetworkArgs) -> Result<Felt, ScriptError> {
    match &network.chain_id {
        Some(chain_id) => cairo_short_string_to_felt(chain_id)
            .map_err(|e| ScriptError::ClientInitialization(e.to_string())),
        None => setup_provider(&network.rpc_url)?
            .chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string())),
    }
}

/// Sets up an account for the given address, signing with the given key
pub fn setup_account(
    address: Felt,
    signing_key: SigningKey,
    rpc_url: &str,
    chain_id: Felt,
) -> Result<ScriptAccount, ScriptError> {
    let provider = setup_provider(rpc_url)?;
    let signer = LocalWallet::from(signing_key);

    let mut account =
        SingleOwnerAccount::new(provider, signer, address, chain_id, ExecutionEncoding::New);
    account.set_block_id(BlockId::Tag(BlockTag::Pending));

    Ok(account)
}

/// Sets up an account from the hex-encoded address & private key given on the command line
pub async fn setup_account_from_hex(
    address: &str,
    private_key: &str,
    network: &NetworkArgs,
) -> Result<ScriptAccount, ScriptError> {
    let address = parse_felt(address)?;
    let signing_key = SigningKey::from_secret_scalar(parse_felt(private_key)?);
    let chain_id = resolve_chain_id(network).await?;

    setup_account(address, signing_key, &network.rpc_url, chain_id)
}

// ------------------------
// | DECLARE & DEPLOY     |
// ------------------------

/// The paths to the Sierra & casm artifacts of a contract in the Scarb package
pub fn artifact_paths(artifacts_path: &str, contract_name: &str) -> (PathBuf, PathBuf) {
    let base = Path::new(artifacts_path);
    (
        base.join(format!(
            "{}_{}.{}",
            PACKAGE_NAME, contract_name, SIERRA_FILE_EXTENSION
        )),
        base.join(format!(
            "{}_{}.{}",
            PACKAGE_NAME, contract_name, CASM_FILE_EXTENSION
        )),
    )
}

/// Reads a JSON artifact from disk
pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ScriptError> {
    let file = File::open(path)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;
    serde_json::from_reader(file)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))
}

/// Returns the given class hash if there is one, otherwise declares the contract
/// found at the given artifact paths and returns its class hash.
pub async fn get_or_declare(
    class_hash_hex: Option<String>,
    sierra_path: PathBuf,
    casm_path: PathBuf,
    account: &ScriptAccount,
) -> Result<Felt, ScriptError> {
    if let Some(class_hash_hex) = class_hash_hex {
        let class_hash = parse_felt(&class_hash_hex)?;
        debug!("Using provided class hash: {:#064x}", class_hash);
        Ok(class_hash)
    } else {
        let class_hash = declare(sierra_path, casm_path, account).await?;
        debug!("Declared contract with class hash: {:#064x}", class_hash);
        Ok(class_hash)
    }
}

/// Declares the contract found at the given artifact paths, returning its class hash.
///
/// Classes can only be declared once per network, so if the node already knows the
/// class this skips the declaration.
pub async fn declare(
    sierra_path: PathBuf,
    casm_path: PathBuf,
    account: &ScriptAccount,
) -> Result<Felt, ScriptError> {
    let sierra_contract: SierraClass = read_artifact(&sierra_path)?;
    let flattened_class = sierra_contract
        .flatten()
        .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
    let class_hash = flattened_class.class_hash();

    if is_declared(account.provider(), class_hash).await? {
        debug!("Class {:#064x} already declared", class_hash);
        return Ok(class_hash);
    }

    let casm_contract: CompiledClass = read_artifact(&casm_path)?;
    let casm_class_hash = casm_contract
        .class_hash()
        .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

    let result = account
        .declare_v3(Arc::new(flattened_class), casm_class_hash)
        .send()
        .await
        .map_err(|e| ScriptError::ClassDeclaration(e.to_string()))?;
    trace!("Declaration result: {:?}", result);

    wait_for_acceptance(account.provider(), result.transaction_hash).await?;
    Ok(result.class_hash)
}

/// Whether the node knows a class with the given hash
pub async fn is_declared(provider: &ScriptProvider, class_hash: Felt) -> Result<bool, ScriptError> {
    match provider
        .get_class(BlockId::Tag(BlockTag::Latest), class_hash)
        .await
    {
        Ok(_) => Ok(true),
        Err(ProviderError::StarknetError(StarknetError::ClassHashNotFound)) => Ok(false),
        Err(e) => Err(ScriptError::ClassDeclaration(e.to_string())),
    }
}

/// Deploys an instance of the given class through the Universal Deployer,
/// waiting for the deployment to be accepted.
///
/// Returns the address of the deployed contract & the deployment transaction hash.
pub async fn deploy(
    account: &ScriptAccount,
    class_hash: Felt,
    calldata: Vec<Felt>,
    salt: Felt,
) -> Result<(Felt, Felt), ScriptError> {
    let contract_address =
        get_udc_deployed_address(salt, class_hash, &UdcUniqueness::NotUnique, &calldata);

    let contract_factory = ContractFactory::new(class_hash, account);
    let InvokeTransactionResult { transaction_hash } = contract_factory
        .deploy_v3(calldata, salt, false /* unique */)
        .send()
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;
    trace!("Deploy transaction hash: {:#064x}", transaction_hash);

    wait_for_acceptance(account.provider(), transaction_hash).await?;
    Ok((contract_address, transaction_hash))
}

/// Builds the proxy constructor calldata: the implementation class hash, followed by the
/// selector of the initializer to library-call & its (length-prefixed) calldata.
pub fn proxy_constructor_calldata(
    implementation_class_hash: Felt,
    initializer: &str,
    initializer_calldata: &[Felt],
) -> Result<Vec<Felt>, ScriptError> {
    let selector = get_selector_from_name(initializer)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;

    let mut calldata = vec![
        implementation_class_hash,
        selector,
        Felt::from(initializer_calldata.len()),
    ];
    calldata.extend_from_slice(initializer_calldata);

    Ok(calldata)
}

// ----------------
// | TRANSACTIONS |
// ----------------

/// Polls for the receipt of the given transaction until it is found, erroring if the
/// transaction reverted or did not show up in time.
pub async fn wait_for_acceptance(
    provider: &ScriptProvider,
    transaction_hash: Felt,
) -> Result<TransactionReceiptWithBlockInfo, ScriptError> {
    let timeout = Duration::from_secs(TX_TIMEOUT_SECS);
    let start = Instant::now();

    loop {
        match provider.get_transaction_receipt(transaction_hash).await {
            Ok(receipt) => {
                return match receipt.receipt.execution_result() {
                    ExecutionResult::Succeeded => Ok(receipt),
                    ExecutionResult::Reverted { reason } => {
                        Err(ScriptError::TransactionReverted(reason.clone()))
                    }
                };
            }
            Err(ProviderError::StarknetError(StarknetError::TransactionHashNotFound)) => {
                trace!("Transaction {:#064x} not yet received", transaction_hash);
            }
            Err(e) => return Err(ScriptError::ContractInteraction(e.to_string())),
        }

        if start.elapsed() >= timeout {
            return Err(ScriptError::TransactionTimeout(format!(
                "{:#064x}",
                transaction_hash
            )));
        }
        sleep(Duration::from_millis(TX_POLL_INTERVAL_MS)).await;
    }
}

// ----------------
// | MISC HELPERS |
// ----------------

/// Parses a hex-encoded field element
pub fn parse_felt(hex: &str) -> Result<Felt, ScriptError> {
    Felt::from_hex(hex).map_err(|e| ScriptError::CalldataConstruction(format!("{}: {}", hex, e)))
}

/// Parses the given salt, or samples a random one
pub fn salt_or_random(salt: Option<&str>) -> Result<Felt, ScriptError> {
    match salt {
        Some(salt) => parse_felt(salt),
        None => {
            let mut bytes = [0_u8; NUM_BYTES_FELT];
            // Leave the top byte empty so the salt is always below the field modulus
            thread_rng().fill(&mut bytes[1..]);
            Ok(Felt::from_bytes_be(&bytes))
        }
    }
}

/// Errors with the given message unless the condition holds
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), ScriptError> {
    if condition {
        Ok(())
    } else {
        Err(ScriptError::CheckFailed(message.into()))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use starknet::core::{types::Felt, utils::get_selector_from_name};

    use super::{artifact_paths, parse_felt, proxy_constructor_calldata, salt_or_random};

    #[test]
    fn test_artifact_paths() {
        let (sierra, casm) = artifact_paths("contracts/target/dev", "Proxy");

        assert_eq!(
            sierra,
            Path::new("contracts/target/dev/upgradeable_proxy_Proxy.contract_class.json")
        );
        assert_eq!(
            casm,
            Path::new("contracts/target/dev/upgradeable_proxy_Proxy.compiled_contract_class.json")
        );
    }

    #[test]
    fn test_proxy_constructor_calldata() {
        let implementation = Felt::from(0x1234_u64);
        let admin = Felt::from(0xabcd_u64);

        let calldata = proxy_constructor_calldata(implementation, "initializer", &[admin]).unwrap();

        assert_eq!(
            calldata,
            vec![
                implementation,
                get_selector_from_name("initializer").unwrap(),
                Felt::ONE,
                admin,
            ]
        );
    }

    #[test]
    fn test_parse_felt() {
        assert_eq!(parse_felt("0x10").unwrap(), Felt::from(16_u64));
        assert!(parse_felt("not a felt").is_err());
    }

    #[test]
    fn test_salt_or_random() {
        assert_eq!(salt_or_random(Some("0x5")).unwrap(), Felt::from(5_u64));

        let a = salt_or_random(None).unwrap();
        let b = salt_or_random(None).unwrap();
        assert_ne!(a, b);
    }
}
