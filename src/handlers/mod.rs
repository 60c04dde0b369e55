pub mod accounts;
pub mod transactions;
pub mod withdrawals;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::amount::numeric_to_decimal;
use crate::db::models::{Asset, TransactionRecord, TxKind, TxStatus};
use crate::error::LedgerError;
use crate::AppState;

/// API representation of a transaction: amounts rendered as decimal strings
/// in the asset's scale.
#[derive(Debug, Serialize)]
pub struct TransactionView {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Option<Uuid>,
    pub asset: Asset,
    pub amount: String,
    pub fee: String,
    pub kind: TxKind,
    pub status: TxStatus,
    pub external_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionView {
    pub fn from_record(record: &TransactionRecord) -> Result<Self, LedgerError> {
        Ok(Self {
            id: record.id,
            sender_id: record.sender_id,
            receiver_id: record.receiver_id,
            asset: record.asset,
            amount: numeric_to_decimal(record.asset, &record.amount)?,
            fee: numeric_to_decimal(record.asset, &record.fee)?,
            kind: record.kind,
            status: record.status,
            external_ref: record.external_ref.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub db: String,
    pub db_pool: DbPoolStats,
}

#[derive(Debug, Serialize)]
pub struct DbPoolStats {
    pub active_connections: u32,
    pub idle_connections: u32,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let pool = &state.db;
    let response = HealthStatus {
        status: if db_status == "connected" {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        db: db_status.to_string(),
        db_pool: DbPoolStats {
            active_connections: pool.size(),
            idle_connections: pool.num_idle() as u32,
        },
    };

    let status_code = if db_status == "connected" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
