use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::Asset;
use crate::providers::{LightningError, NetworkError};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient {asset} balance")]
    InsufficientFunds { asset: Asset },

    #[error("Account {0} not found")]
    AccountNotFound(Uuid),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid {asset} destination")]
    InvalidAddress { asset: Asset },

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Lightning error: {0}")]
    Lightning(#[from] LightningError),

    /// External dispatch failed after funds were reserved; the reservation
    /// has been refunded and the transaction marked FAILED.
    #[error("Withdrawal {transaction_id} failed and was refunded")]
    WithdrawalFailed {
        transaction_id: Uuid,
        #[source]
        source: anyhow::Error,
    },

    /// The ledger could not be closed out after the external call resolved.
    /// Ledger state and external state may diverge; operators must reconcile
    /// using the stored external reference. Never retried automatically.
    #[error("Transaction {transaction_id} requires manual reconciliation")]
    ReconciliationRequired { transaction_id: Uuid },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::Validation(_)
            | LedgerError::InsufficientFunds { .. }
            | LedgerError::Unsupported(_)
            | LedgerError::InvalidAddress { .. } => StatusCode::BAD_REQUEST,
            LedgerError::AccountNotFound(_) | LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::Network(_)
            | LedgerError::Lightning(_)
            | LedgerError::WithdrawalFailed { .. } => StatusCode::BAD_GATEWAY,
            LedgerError::ReconciliationRequired { .. } | LedgerError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        if let LedgerError::ReconciliationRequired { transaction_id } = &self {
            tracing::error!(%transaction_id, "manual reconciliation required");
        }

        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
