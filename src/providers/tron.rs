use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::providers::{NetworkError, NetworkProvider};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Fallback energy fee (sun) when the chain parameter is missing from the
/// node response.
const DEFAULT_ENERGY_FEE: u128 = 420;

/// Tron capability for USDT (TRC-20). Chain parameters come from a
/// TronGrid-style node; transfers go through the custody node, which holds
/// the signing keys.
#[derive(Clone)]
pub struct TronProvider {
    client: Client,
    node_url: String,
}

#[derive(Debug, Deserialize)]
struct ChainParameters {
    #[serde(rename = "chainParameter", default)]
    chain_parameter: Vec<ChainParameter>,
}

#[derive(Debug, Deserialize)]
struct ChainParameter {
    key: String,
    #[serde(default)]
    value: i64,
}

impl TronProvider {
    pub fn new(node_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self { client, node_url }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.node_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl NetworkProvider for TronProvider {
    async fn estimate_base_cost(&self) -> Result<u128, NetworkError> {
        let params = self
            .client
            .post(self.endpoint("/wallet/getchainparameters"))
            .send()
            .await?
            .error_for_status()?
            .json::<ChainParameters>()
            .await?;

        let energy_fee = params
            .chain_parameter
            .iter()
            .find(|p| p.key == "getEnergyFee")
            .map(|p| p.value.max(0) as u128)
            .unwrap_or(DEFAULT_ENERGY_FEE);

        Ok(energy_fee)
    }

    async fn send(
        &self,
        destination: &str,
        amount: u128,
        fee: u128,
    ) -> Result<String, NetworkError> {
        let body = json!({
            "to_address": destination,
            "amount": amount.to_string(),
            "fee_limit": fee.to_string(),
        });

        let response: serde_json::Value = self
            .client
            .post(self.endpoint("/wallet/transfer"))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(message) = response.get("Error").and_then(|e| e.as_str()) {
            return Err(NetworkError::Rejected(message.to_string()));
        }

        response
            .get("txid")
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| NetworkError::InvalidResponse("missing txid".to_string()))
    }

    fn validate_address(&self, address: &str) -> bool {
        address.len() == 34
            && address.starts_with('T')
            && address.chars().all(|c| BASE58_ALPHABET.contains(c))
    }
}
