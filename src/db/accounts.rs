use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::Account;
use crate::db::DbTx;
use crate::error::LedgerError;

pub async fn create(pool: &PgPool) -> Result<Account, LedgerError> {
    let account = sqlx::query_as::<_, Account>(
        "INSERT INTO accounts (id, created_at) VALUES ($1, NOW()) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .fetch_one(pool)
    .await?;

    Ok(account)
}

/// Checks the account inside the caller's unit of work so existence holds
/// for the rest of the transaction.
pub async fn ensure_exists(exec: &mut DbTx<'_>, id: Uuid) -> Result<(), LedgerError> {
    let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM accounts WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut **exec)
        .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(LedgerError::AccountNotFound(id)),
    }
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Account, LedgerError> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(LedgerError::AccountNotFound(id))
}
