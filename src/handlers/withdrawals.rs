use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{Asset, LightningInvoice};
use crate::db::transactions;
use crate::error::LedgerError;
use crate::handlers::TransactionView;
use crate::providers::InvoiceState;
use crate::services::{Channel, FeeTier};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub account_id: Uuid,
    pub asset: Asset,
    pub amount: String,
    pub destination: String,
    pub fee_tier: FeeTier,
    pub channel: Channel,
}

pub async fn withdraw(
    State(state): State<AppState>,
    Json(payload): Json<WithdrawRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let record = state
        .withdrawals
        .withdraw(
            payload.account_id,
            payload.asset,
            &payload.amount,
            &payload.destination,
            payload.fee_tier,
            payload.channel,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionView::from_record(&record)?)))
}

pub async fn get_fees(
    State(state): State<AppState>,
    Path(asset): Path<String>,
) -> Result<impl IntoResponse, LedgerError> {
    let asset: Asset = asset.parse().map_err(LedgerError::Validation)?;
    let schedule = state.fees.estimate(asset).await?;
    Ok(Json(schedule))
}

#[derive(Debug, Serialize)]
pub struct LightningStatusView {
    pub invoice: LightningInvoice,
    /// Live state as reported by the gateway; absent when the gateway is
    /// unreachable.
    pub gateway_state: Option<InvoiceState>,
}

pub async fn lightning_status(
    State(state): State<AppState>,
    Path(payment_hash): Path<String>,
) -> Result<impl IntoResponse, LedgerError> {
    let invoice = transactions::invoice_by_payment_hash(&state.db, &payment_hash).await?;
    let gateway_state = state.lightning.invoice_status(&payment_hash).await.ok();

    Ok(Json(LightningStatusView {
        invoice,
        gateway_state,
    }))
}
