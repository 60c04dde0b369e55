use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Supported assets. Closed enumeration; each carries a fixed decimal scale
/// and maps to one external network provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "asset", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    Btc,
    Eth,
    Usdt,
}

impl Asset {
    /// Number of fractional digits in the decimal representation. Base units
    /// are satoshi for BTC, wei for ETH and the TRC-20 6-digit unit for USDT.
    pub fn scale(&self) -> u32 {
        match self {
            Asset::Btc => 8,
            Asset::Eth => 18,
            Asset::Usdt => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Usdt => "USDT",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BTC" => Ok(Asset::Btc),
            "ETH" => Ok(Asset::Eth),
            "USDT" => Ok(Asset::Usdt),
            other => Err(format!("unknown asset: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tx_kind", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TxKind {
    Internal,
    Withdrawal,
    Lightning,
}

/// Lifecycle state of a transaction record. Transitions are monotonic:
/// PENDING -> COMPLETED or PENDING -> FAILED, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tx_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TxStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Expired,
    Failed,
}

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One balance row per (account, asset). Amount is integer base units,
/// never negative.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Balance {
    pub account_id: Uuid,
    pub asset: Asset,
    pub amount: BigDecimal,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Option<Uuid>,
    pub asset: Asset,
    pub amount: BigDecimal,
    pub fee: BigDecimal,
    pub kind: TxKind,
    pub status: TxStatus,
    pub external_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for a new transaction row. Amounts are integer base units.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub sender_id: Uuid,
    pub receiver_id: Option<Uuid>,
    pub asset: Asset,
    pub amount: u128,
    pub fee: u128,
    pub kind: TxKind,
    pub status: TxStatus,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LightningInvoice {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub payment_request: String,
    pub payment_hash: Option<String>,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_scales_match_networks() {
        assert_eq!(Asset::Btc.scale(), 8);
        assert_eq!(Asset::Eth.scale(), 18);
        assert_eq!(Asset::Usdt.scale(), 6);
    }

    #[test]
    fn asset_round_trips_through_str() {
        for asset in [Asset::Btc, Asset::Eth, Asset::Usdt] {
            assert_eq!(asset.as_str().parse::<Asset>().unwrap(), asset);
        }
        assert!("DOGE".parse::<Asset>().is_err());
    }

    #[test]
    fn enums_serialize_uppercase() {
        assert_eq!(serde_json::to_string(&TxStatus::Pending).unwrap(), "\"PENDING\"");
        assert_eq!(serde_json::to_string(&TxKind::Withdrawal).unwrap(), "\"WITHDRAWAL\"");
        assert_eq!(serde_json::to_string(&InvoiceStatus::Paid).unwrap(), "\"PAID\"");
        assert_eq!(serde_json::to_string(&Asset::Usdt).unwrap(), "\"USDT\"");
    }
}
