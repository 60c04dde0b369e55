use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::providers::{NetworkError, NetworkProvider};

/// Ethereum capability over JSON-RPC. The node owns the hot wallet account;
/// `eth_sendTransaction` signs server-side, so no key material passes through
/// the engine.
#[derive(Clone)]
pub struct EthereumProvider {
    client: Client,
    rpc_url: String,
    hot_wallet: String,
}

impl EthereumProvider {
    pub fn new(rpc_url: String, hot_wallet: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            rpc_url,
            hot_wallet,
        }
    }

    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, NetworkError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
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
            .cloned()
            .ok_or_else(|| NetworkError::InvalidResponse("missing RPC result".to_string()))
    }
}

fn parse_hex_quantity(value: &serde_json::Value) -> Result<u128, NetworkError> {
    let raw = value
        .as_str()
        .ok_or_else(|| NetworkError::InvalidResponse("quantity is not a string".to_string()))?;
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    u128::from_str_radix(digits, 16)
        .map_err(|_| NetworkError::InvalidResponse(format!("bad hex quantity: {}", raw)))
}

#[async_trait]
impl NetworkProvider for EthereumProvider {
    async fn estimate_base_cost(&self) -> Result<u128, NetworkError> {
        let result = self.rpc_call("eth_gasPrice", json!([])).await?;
        parse_hex_quantity(&result)
    }

    async fn send(
        &self,
        destination: &str,
        amount: u128,
        fee: u128,
    ) -> Result<String, NetworkError> {
        let params = json!([{
            "from": self.hot_wallet,
            "to": destination,
            "value": format!("{:#x}", amount),
            "gasPrice": format!("{:#x}", fee),
        }]);

        let result = self.rpc_call("eth_sendTransaction", params).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| NetworkError::InvalidResponse("missing tx hash".to_string()))
    }

    fn validate_address(&self, address: &str) -> bool {
        let Some(hex) = address.strip_prefix("0x") else {
            return false;
        };
        hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base: &str) -> EthereumProvider {
        EthereumProvider::new(
            base.to_string(),
            "0x8ba1f109551bd432803012645ac136ddd64dba72".to_string(),
        )
    }

    #[test]
    fn validates_hex_addresses() {
        let p = provider("http://localhost");
        assert!(p.validate_address("0x52908400098527886E0F7030069857D2E4169EE7"));
        assert!(p.validate_address("0xde709f2102306220921060314715629080e2fb77"));
        assert!(!p.validate_address("52908400098527886E0F7030069857D2E4169EE7"));
        assert!(!p.validate_address("0x123"));
        assert!(!p.validate_address("0xzz08400098527886E0F7030069857D2E4169EE7"));
    }

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_hex_quantity(&json!("0x3b9aca00")).unwrap(), 1_000_000_000);
        assert_eq!(parse_hex_quantity(&json!("0x0")).unwrap(), 0);
        assert!(parse_hex_quantity(&json!("nope")).is_err());
        assert!(parse_hex_quantity(&json!(12)).is_err());
    }

    #[tokio::test]
    async fn estimates_gas_price() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x3b9aca00"}"#)
            .create_async()
            .await;

        let cost = provider(&server.url()).estimate_base_cost().await.unwrap();
        assert_eq!(cost, 1_000_000_000);
    }

    #[tokio::test]
    async fn send_surfaces_rpc_rejection() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"insufficient funds for gas"}}"#)
            .create_async()
            .await;

        let result = provider(&server.url())
            .send("0xde709f2102306220921060314715629080e2fb77", 1, 1)
            .await;
        assert!(matches!(result, Err(NetworkError::Rejected(_))));
    }
}
