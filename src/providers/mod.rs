//! External payment capabilities.
//!
//! One [`NetworkProvider`] per asset plus one [`LightningGateway`], each
//! constructed once at startup and injected into the services. Key custody
//! and transaction signing stay behind the remote node; the engine only sees
//! the external reference a successful send returns.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::db::models::Asset;
use crate::error::LedgerError;

pub mod bitcoin;
pub mod ethereum;
pub mod lnbits;
pub mod tron;

pub use bitcoin::BitcoinProvider;
pub use ethereum::EthereumProvider;
pub use lnbits::LnBitsClient;
pub use tron::TronProvider;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider rejected the request: {0}")]
    Rejected(String),
    #[error("invalid response from provider: {0}")]
    InvalidResponse(String),
}

#[derive(Error, Debug)]
pub enum LightningError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gateway rejected the payment: {0}")]
    Rejected(String),
    #[error("invalid response from gateway: {0}")]
    InvalidResponse(String),
    #[error("lightning gateway circuit breaker is open")]
    CircuitOpen,
}

/// Gateway-side view of a Lightning payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceState {
    Pending,
    Paid,
    Expired,
}

/// On-chain capability for a single asset.
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    /// Base network cost in base units of the asset. Fee tiers are derived
    /// from this single quote.
    async fn estimate_base_cost(&self) -> Result<u128, NetworkError>;

    /// Broadcasts a payment and returns the on-chain transaction hash.
    async fn send(&self, destination: &str, amount: u128, fee: u128)
        -> Result<String, NetworkError>;

    /// Structural address check for this asset's network.
    fn validate_address(&self, address: &str) -> bool;
}

/// Lightning Network capability (BTC only).
#[async_trait]
pub trait LightningGateway: Send + Sync {
    /// Pays a bolt11 invoice and returns the payment hash.
    async fn pay_invoice(&self, bolt11: &str) -> Result<String, LightningError>;

    /// True when the gateway can decode the invoice.
    async fn validate_invoice(&self, bolt11: &str) -> bool;

    async fn invoice_status(&self, payment_hash: &str) -> Result<InvoiceState, LightningError>;
}

/// Asset-keyed set of on-chain providers, built once at startup.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Asset, Arc<dyn NetworkProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, asset: Asset, provider: Arc<dyn NetworkProvider>) -> Self {
        self.providers.insert(asset, provider);
        self
    }

    pub fn get(&self, asset: Asset) -> Result<Arc<dyn NetworkProvider>, LedgerError> {
        self.providers
            .get(&asset)
            .cloned()
            .ok_or_else(|| LedgerError::Unsupported(format!("no provider for asset {}", asset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullProvider;

    #[async_trait]
    impl NetworkProvider for NullProvider {
        async fn estimate_base_cost(&self) -> Result<u128, NetworkError> {
            Ok(1)
        }

        async fn send(&self, _: &str, _: u128, _: u128) -> Result<String, NetworkError> {
            Ok("0xabc".to_string())
        }

        fn validate_address(&self, _: &str) -> bool {
            true
        }
    }

    #[test]
    fn registry_resolves_registered_assets() {
        let registry = ProviderRegistry::new().register(Asset::Btc, Arc::new(NullProvider));
        assert!(registry.get(Asset::Btc).is_ok());
        assert!(matches!(
            registry.get(Asset::Eth),
            Err(LedgerError::Unsupported(_))
        ));
    }
}
