//! Fee estimation: one base-cost quote from the asset's provider, fixed
//! per-tier coefficients on top. Quotes are advisory and fetched fresh per
//! request; nothing here caches.

use serde::{Deserialize, Serialize};

use crate::amount::format_units;
use crate::db::models::Asset;
use crate::error::LedgerError;
use crate::providers::ProviderRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeTier {
    Fast,
    Medium,
    Slow,
}

/// Per-tier fee quotes as decimal amount strings.
#[derive(Debug, Serialize)]
pub struct FeeSchedule {
    pub fast: String,
    pub medium: String,
    pub slow: String,
}

#[derive(Clone)]
pub struct FeeEstimator {
    providers: ProviderRegistry,
}

impl FeeEstimator {
    pub fn new(providers: ProviderRegistry) -> Self {
        Self { providers }
    }

    /// All three tiers from a single base-cost query.
    pub async fn estimate(&self, asset: Asset) -> Result<FeeSchedule, LedgerError> {
        let base = self.providers.get(asset)?.estimate_base_cost().await?;

        Ok(FeeSchedule {
            fast: format_units(asset, tier_units(asset, FeeTier::Fast, base)),
            medium: format_units(asset, tier_units(asset, FeeTier::Medium, base)),
            slow: format_units(asset, tier_units(asset, FeeTier::Slow, base)),
        })
    }

    /// Fee for one tier in base units, as reserved by the orchestrator.
    pub async fn fee_units(&self, asset: Asset, tier: FeeTier) -> Result<u128, LedgerError> {
        let base = self.providers.get(asset)?.estimate_base_cost().await?;
        Ok(tier_units(asset, tier, base))
    }
}

/// Coefficients are asset-specific policy, applied as integer ratios so no
/// precision is lost: BTC scales 3x/2x/1x, ETH and Tron-USDT 2x/1.5x/1x.
fn tier_units(asset: Asset, tier: FeeTier, base: u128) -> u128 {
    let (num, den): (u128, u128) = match (asset, tier) {
        (Asset::Btc, FeeTier::Fast) => (3, 1),
        (Asset::Btc, FeeTier::Medium) => (2, 1),
        (_, FeeTier::Fast) => (2, 1),
        (_, FeeTier::Medium) => (3, 2),
        (_, FeeTier::Slow) => (1, 1),
    };
    base.saturating_mul(num) / den
}
