//! Ledger store: the only code allowed to mutate balance rows.
//!
//! Every mutation runs inside a caller-supplied [`DbTx`]. Reservations use a
//! single conditional UPDATE, so Postgres row locking linearizes concurrent
//! reservations against the same (account, asset) pair: two debits can never
//! both pass the funds check when their sum exceeds the balance.

use bigdecimal::BigDecimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::amount::numeric_to_units;
use crate::db::models::{Asset, Balance};
use crate::db::DbTx;
use crate::error::LedgerError;

/// Current balance in base units; 0 when no row exists yet.
pub async fn balance_of(
    exec: &mut DbTx<'_>,
    account: Uuid,
    asset: Asset,
) -> Result<u128, LedgerError> {
    let row: Option<(BigDecimal,)> =
        sqlx::query_as("SELECT amount FROM balances WHERE account_id = $1 AND asset = $2")
            .bind(account)
            .bind(asset)
            .fetch_optional(&mut **exec)
            .await?;

    match row {
        Some((amount,)) => numeric_to_units(&amount),
        None => Ok(0),
    }
}

/// Debits `units` if and only if the balance covers it. A missing balance
/// row counts as zero. The guarded UPDATE is the funds check and the debit
/// in one step.
pub async fn reserve(
    exec: &mut DbTx<'_>,
    account: Uuid,
    asset: Asset,
    units: u128,
) -> Result<(), LedgerError> {
    let result = sqlx::query(
        r#"
        UPDATE balances
        SET amount = amount - $3::numeric
        WHERE account_id = $1 AND asset = $2 AND amount >= $3::numeric
        "#,
    )
    .bind(account)
    .bind(asset)
    .bind(units.to_string())
    .execute(&mut **exec)
    .await?;

    if result.rows_affected() == 0 {
        return Err(LedgerError::InsufficientFunds { asset });
    }

    Ok(())
}

/// Credits `units`, creating the balance row on first credit.
pub async fn credit(
    exec: &mut DbTx<'_>,
    account: Uuid,
    asset: Asset,
    units: u128,
) -> Result<(), LedgerError> {
    sqlx::query(
        r#"
        INSERT INTO balances (account_id, asset, amount)
        VALUES ($1, $2, $3::numeric)
        ON CONFLICT (account_id, asset)
        DO UPDATE SET amount = balances.amount + EXCLUDED.amount
        "#,
    )
    .bind(account)
    .bind(asset)
    .bind(units.to_string())
    .execute(&mut **exec)
    .await?;

    Ok(())
}

/// Compensating credit after a failed external send.
pub async fn refund(
    exec: &mut DbTx<'_>,
    account: Uuid,
    asset: Asset,
    units: u128,
) -> Result<(), LedgerError> {
    tracing::warn!(%account, %asset, units, "refunding reserved funds");
    credit(exec, account, asset, units).await
}

pub async fn balances_for(pool: &PgPool, account: Uuid) -> Result<Vec<Balance>, LedgerError> {
    let balances = sqlx::query_as::<_, Balance>(
        "SELECT account_id, asset, amount FROM balances WHERE account_id = $1 ORDER BY asset",
    )
    .bind(account)
    .fetch_all(pool)
    .await?;

    Ok(balances)
}
