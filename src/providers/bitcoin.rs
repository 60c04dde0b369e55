use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::amount::format_units;
use crate::db::models::Asset;
use crate::providers::{NetworkError, NetworkProvider};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Bitcoin capability: fee quotes from a BlockCypher-style chain endpoint,
/// sends through the custody wallet node's JSON-RPC interface.
#[derive(Clone)]
pub struct BitcoinProvider {
    client: Client,
    fee_url: String,
    rpc_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChainFees {
    medium_fee_per_kb: u64,
}

impl BitcoinProvider {
    pub fn new(fee_url: String, rpc_url: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            fee_url,
            rpc_url,
            api_key,
        }
    }
}

#[async_trait]
impl NetworkProvider for BitcoinProvider {
    async fn estimate_base_cost(&self) -> Result<u128, NetworkError> {
        let url = format!(
            "{}/fees?token={}",
            self.fee_url.trim_end_matches('/'),
            self.api_key
        );
        let fees = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<ChainFees>()
            .await?;

        // Quote is per kB; the engine works in sat/vB.
        Ok(u128::from(fees.medium_fee_per_kb / 1000))
    }

    async fn send(
        &self,
        destination: &str,
        amount: u128,
        fee: u128,
    ) -> Result<String, NetworkError> {
        let body = json!({
            "jsonrpc": "1.0",
            "id": "ledger-core",
            "method": "sendtoaddress",
            "params": {
                "address": destination,
                "amount": format_units(Asset::Btc, amount),
                "fee_rate": fee.to_string(),
            },
        });

        let response: serde_json::Value = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown RPC error");
            return Err(NetworkError::Rejected(message.to_string()));
        }

        response
            .get("result")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| NetworkError::InvalidResponse("missing txid in RPC result".to_string()))
    }

    fn validate_address(&self, address: &str) -> bool {
        is_bech32_address(address) || is_base58_address(address)
    }
}

fn is_bech32_address(address: &str) -> bool {
    let Some(data) = address.strip_prefix("bc1") else {
        return false;
    };
    (14..=74).contains(&address.len()) && data.chars().all(|c| BECH32_CHARSET.contains(c))
}

fn is_base58_address(address: &str) -> bool {
    (address.starts_with('1') || address.starts_with('3'))
        && (26..=35).contains(&address.len())
        && address.chars().all(|c| BASE58_ALPHABET.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base: &str) -> BitcoinProvider {
        BitcoinProvider::new(base.to_string(), format!("{}/rpc", base), "key".to_string())
    }

    #[test]
    fn accepts_known_address_formats() {
        let p = provider("http://localhost");
        assert!(p.validate_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"));
        assert!(p.validate_address("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy"));
        assert!(p.validate_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        let p = provider("http://localhost");
        assert!(!p.validate_address(""));
        assert!(!p.validate_address("0x52908400098527886E0F7030069857D2E4169EE7"));
        assert!(!p.validate_address("1Il0Il0Il0Il0Il0Il0Il0Il0Il0")); // forbidden base58 characters
        assert!(!p.validate_address("bc1QW508")); // bech32 data part is lowercase
        assert!(!p.validate_address("2NEWaddressWrongPrefix00000000000"));
    }

    #[tokio::test]
    async fn estimates_fee_from_chain_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Regex(r"/fees.*".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"medium_fee_per_kb": 25000}"#)
            .create_async()
            .await;

        let cost = provider(&server.url()).estimate_base_cost().await.unwrap();
        assert_eq!(cost, 25);
    }

    #[tokio::test]
    async fn fee_endpoint_failure_is_a_network_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Regex(r"/fees.*".into()))
            .with_status(500)
            .create_async()
            .await;

        let result = provider(&server.url()).estimate_base_cost().await;
        assert!(matches!(result, Err(NetworkError::Http(_))));
    }

    #[tokio::test]
    async fn send_returns_txid_from_rpc_result() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/rpc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result":"f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16","error":null,"id":"ledger-core"}"#)
            .create_async()
            .await;

        let txid = provider(&server.url())
            .send("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", 30_000_000, 25)
            .await
            .unwrap();
        assert!(txid.starts_with("f4184fc5"));
    }

    #[tokio::test]
    async fn send_maps_rpc_error_to_rejection() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/rpc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result":null,"error":{"code":-6,"message":"Insufficient funds"},"id":"ledger-core"}"#)
            .create_async()
            .await;

        let result = provider(&server.url())
            .send("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", 30_000_000, 25)
            .await;
        assert!(matches!(result, Err(NetworkError::Rejected(_))));
    }
}
