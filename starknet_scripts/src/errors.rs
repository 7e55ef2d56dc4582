//! Definitions of errors that can occur during the execution of the Starknet scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the Starknet scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error initializing the RPC client or an account
    ClientInitialization(String),
    /// Error reading or parsing a Scarb compilation artifact
    ArtifactParsing(String),
    /// Error creating a new account on the network
    AccountCreation(String),
    /// Error funding an account through the devnet
    Funding(String),
    /// Error declaring a contract class
    ClassDeclaration(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method, or talking to the node
    ContractInteraction(String),
    /// The network refused to accept a transaction
    TransactionRejected(String),
    /// A transaction was included, but its execution reverted
    TransactionReverted(String),
    /// A transaction was not accepted in time
    TransactionTimeout(String),
    /// Error resolving an entry point against a contract's ABI
    Abi(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// A check on the observed contract state failed
    CheckFailed(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::AccountCreation(s) => write!(f, "error creating account: {}", s),
            ScriptError::Funding(s) => write!(f, "error funding account: {}", s),
            ScriptError::ClassDeclaration(s) => write!(f, "error declaring class: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::TransactionRejected(s) => write!(f, "transaction rejected: {}", s),
            ScriptError::TransactionReverted(s) => write!(f, "transaction reverted: {}", s),
            ScriptError::TransactionTimeout(s) => {
                write!(f, "timed out waiting for transaction: {}", s)
            }
            ScriptError::Abi(s) => write!(f, "abi error: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::CheckFailed(s) => write!(f, "check failed: {}", s),
        }
    }
}

impl Error for ScriptError {}
