//! A client for the devnet-specific HTTP endpoints, which live next to the JSON-RPC endpoint

use serde::{Deserialize, Serialize};
use starknet::core::types::Felt;
use tracing::debug;
use url::Url;

use crate::{
    commands::utils::parse_felt,
    constants::{FEE_TOKEN_UNIT, MINT_ENDPOINT, PREDEPLOYED_ACCOUNTS_ENDPOINT},
    errors::ScriptError,
};

/// The body of a mint request
#[derive(Debug, Serialize)]
struct MintRequest {
    /// The address to fund, in hex form
    address: String,
    /// The amount to mint, in the smallest denomination of the unit
    amount: u128,
    /// The unit to mint, `FRI` or `WEI`
    unit: &'static str,
}

/// The devnet's response to a mint request
#[derive(Debug, Clone, Deserialize)]
pub struct MintResponse {
    /// The balance of the funded address after minting, as a decimal string
    pub new_balance: String,
    /// The unit of the balance
    pub unit: String,
    /// The hash of the minting transaction
    #[serde(default)]
    pub tx_hash: Option<String>,
}

/// An account the devnet was started with
#[derive(Debug, Clone, Deserialize)]
pub struct PredeployedAccount {
    /// The address of the account, in hex form
    pub address: String,
    /// The public key of the account, in hex form
    pub public_key: String,
    /// The private key of the account, in hex form
    pub private_key: String,
}

impl PredeployedAccount {
    /// The address of the account
    pub fn address(&self) -> Result<Felt, ScriptError> {
        parse_felt(&self.address)
    }

    /// The private key of the account
    pub fn private_key(&self) -> Result<Felt, ScriptError> {
        parse_felt(&self.private_key)
    }
}

/// A client for a devnet's `/mint` & `/predeployed_accounts` endpoints
#[derive(Debug, Clone)]
pub struct DevnetClient {
    /// The underlying HTTP client
    client: reqwest::Client,
    /// The base URL of the devnet
    base_url: Url,
}

impl DevnetClient {
    /// Creates a client for the devnet at the given base URL
    pub fn new(devnet_url: &str) -> Result<Self, ScriptError> {
        let base_url =
            Url::parse(devnet_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    /// Mints the given amount of the fee token to the address
    pub async fn mint(&self, address: Felt, amount: u128) -> Result<MintResponse, ScriptError> {
        let request = MintRequest {
            address: format!("{:#064x}", address),
            amount,
            unit: FEE_TOKEN_UNIT,
        };

        debug!("Minting {} {} to {:#064x}...", amount, FEE_TOKEN_UNIT, address);
        let response = self
            .client
            .post(self.endpoint(MINT_ENDPOINT)?)
            .json(&request)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| ScriptError::Funding(e.to_string()))?;

        response
            .json()
            .await
            .map_err(|e| ScriptError::Funding(e.to_string()))
    }

    /// Lists the accounts the devnet was started with
    pub async fn predeployed_accounts(&self) -> Result<Vec<PredeployedAccount>, ScriptError> {
        debug!("Fetching predeployed accounts...");
        let response = self
            .client
            .get(self.endpoint(PREDEPLOYED_ACCOUNTS_ENDPOINT)?)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| ScriptError::AccountCreation(e.to_string()))?;

        response
            .json()
            .await
            .map_err(|e| ScriptError::AccountCreation(e.to_string()))
    }

    /// The URL of the given devnet endpoint
    fn endpoint(&self, endpoint: &str) -> Result<Url, ScriptError> {
        self.base_url
            .join(endpoint)
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use starknet::core::types::Felt;

    use super::{DevnetClient, MintRequest, MintResponse, PredeployedAccount};

    #[test]
    fn test_mint_request_body() {
        let request = MintRequest {
            address: format!("{:#064x}", Felt::from(0xabc_u64)),
            amount: 1_000_000_000_000_000_000_000,
            unit: "FRI",
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body["address"],
            "0x0000000000000000000000000000000000000000000000000000000000000abc"
        );
        assert_eq!(body["unit"], "FRI");
    }

    #[test]
    fn test_parse_mint_response() {
        let response: MintResponse = serde_json::from_value(json!({
            "new_balance": "1000000000000000000000",
            "unit": "FRI",
            "tx_hash": "0x1"
        }))
        .unwrap();

        assert_eq!(response.unit, "FRI");
        assert_eq!(response.tx_hash.as_deref(), Some("0x1"));
    }

    #[test]
    fn test_parse_predeployed_accounts() {
        let accounts: Vec<PredeployedAccount> = serde_json::from_value(json!([
            {
                "initial_balance": "1000000000000000000000",
                "address": "0x64b48806902a367c8598f4f95c305e8c1a1acba5f082d294a43793113115691",
                "public_key": "0x39d9e6ce352ad4530a0ef5d5a18fd3303c3606a7fa6ac5b620020ad681cc33b",
                "private_key": "0x71d7bb07b9a64f6f78ac4c816aff4da9"
            }
        ]))
        .unwrap();

        assert_eq!(accounts.len(), 1);
        assert_eq!(
            accounts[0].private_key().unwrap(),
            Felt::from(0x71d7bb07b9a64f6f78ac4c816aff4da9_u128)
        );
        assert!(accounts[0].address().is_ok());
    }

    #[test]
    fn test_endpoints_resolve_against_base_url() {
        let client = DevnetClient::new("http://localhost:5050").unwrap();

        assert_eq!(
            client.endpoint("mint").unwrap().as_str(),
            "http://localhost:5050/mint"
        );
    }
}
