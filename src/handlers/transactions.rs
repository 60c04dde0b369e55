use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::Asset;
use crate::db::{accounts, transactions};
use crate::error::LedgerError;
use crate::handlers::TransactionView;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub asset: Asset,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

pub async fn transfer(
    State(state): State<AppState>,
    Json(payload): Json<TransferRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let record = state
        .transfers
        .transfer(
            payload.sender_id,
            payload.receiver_id,
            payload.asset,
            &payload.amount,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionView::from_record(&record)?)))
}

pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, LedgerError> {
    accounts::get(&state.db, id).await?;

    let records = transactions::history(
        &state.db,
        id,
        query.limit.clamp(1, 200),
        query.offset.max(0),
    )
    .await?;
    let views = records
        .iter()
        .map(TransactionView::from_record)
        .collect::<Result<Vec<_>, LedgerError>>()?;

    Ok(Json(views))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, LedgerError> {
    let record = transactions::get(&state.db, id).await?;
    Ok(Json(TransactionView::from_record(&record)?))
}
