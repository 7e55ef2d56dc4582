//! Constants used in the Starknet scripts

/// The default JSON-RPC endpoint of a local `starknet-devnet` node
pub const DEFAULT_RPC_URL: &str = "http://localhost:5050/rpc";

/// The default base URL of a local `starknet-devnet` node, under which
/// the devnet-specific HTTP endpoints live
pub const DEFAULT_DEVNET_URL: &str = "http://localhost:5050";

/// The default directory containing the Scarb build artifacts, relative
/// to the repository root
pub const DEFAULT_ARTIFACTS_PATH: &str = "contracts/target/dev";

/// The file extension Scarb uses for Sierra contract classes
pub const SIERRA_FILE_EXTENSION: &str = "contract_class.json";

/// The file extension Scarb uses for compiled (casm) contract classes
pub const CASM_FILE_EXTENSION: &str = "compiled_contract_class.json";

/// The devnet endpoint used to fund accounts
pub const MINT_ENDPOINT: &str = "mint";

/// The devnet endpoint listing the accounts it was started with
pub const PREDEPLOYED_ACCOUNTS_ENDPOINT: &str = "predeployed_accounts";

/// The fee unit in which freshly created accounts are funded.
/// V3 transactions pay their fees in STRK, denominated in FRI.
pub const FEE_TOKEN_UNIT: &str = "FRI";

/// The amount of FRI minted to each freshly created account (1000 STRK)
pub const DEFAULT_FUNDING_AMOUNT: u128 = 1_000_000_000_000_000_000_000;

/// The number of accounts the demo provisions: an admin & an attacker
pub const NUM_DEMO_ACCOUNTS: usize = 2;

/// The value the demo writes through the proxy
pub const DEFAULT_DEMO_VALUE: u64 = 10;

/// How often to poll for a transaction receipt, in milliseconds
pub const TX_POLL_INTERVAL_MS: u64 = 1_000;

/// How long to wait for a transaction to be accepted, in seconds
pub const TX_TIMEOUT_SECS: u64 = 120;

/// The number of bytes in a field element
pub const NUM_BYTES_FELT: usize = 32;
