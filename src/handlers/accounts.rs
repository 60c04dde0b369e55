use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use uuid::Uuid;

use crate::amount::numeric_to_decimal;
use crate::db::models::Asset;
use crate::db::{accounts, ledger};
use crate::error::LedgerError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct BalanceView {
    pub asset: Asset,
    pub amount: String,
}

pub async fn create_account(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, LedgerError> {
    let account = accounts::create(&state.db).await?;
    tracing::info!(account_id = %account.id, "account created");
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn get_balances(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, LedgerError> {
    accounts::get(&state.db, id).await?;

    let balances = ledger::balances_for(&state.db, id).await?;
    let views = balances
        .iter()
        .map(|b| {
            Ok(BalanceView {
                asset: b.asset,
                amount: numeric_to_decimal(b.asset, &b.amount)?,
            })
        })
        .collect::<Result<Vec<_>, LedgerError>>()?;

    Ok(Json(views))
}
