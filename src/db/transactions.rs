//! Transaction record store. Records are append-only; lifecycle transitions
//! go through the guarded `mark_*` updates so a record leaves PENDING at
//! most once.

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{LightningInvoice, NewTransaction, TransactionRecord};
use crate::db::DbTx;
use crate::error::LedgerError;

pub async fn insert(
    exec: &mut DbTx<'_>,
    new: &NewTransaction,
) -> Result<TransactionRecord, LedgerError> {
    let record = sqlx::query_as::<_, TransactionRecord>(
        r#"
        INSERT INTO transactions (
            id, sender_id, receiver_id, asset, amount, fee, kind, status,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5::numeric, $6::numeric, $7, $8, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.sender_id)
    .bind(new.receiver_id)
    .bind(new.asset)
    .bind(new.amount.to_string())
    .bind(new.fee.to_string())
    .bind(new.kind)
    .bind(new.status)
    .fetch_one(&mut **exec)
    .await?;

    Ok(record)
}

/// PENDING -> COMPLETED. Returns false when the record already left PENDING,
/// which makes concurrent settlement attempts idempotent.
pub async fn mark_completed(
    exec: &mut DbTx<'_>,
    id: Uuid,
    external_ref: &str,
) -> Result<bool, LedgerError> {
    let result = sqlx::query(
        r#"
        UPDATE transactions
        SET status = 'COMPLETED', external_ref = $2, updated_at = NOW()
        WHERE id = $1 AND status = 'PENDING'
        "#,
    )
    .bind(id)
    .bind(external_ref)
    .execute(&mut **exec)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// PENDING -> FAILED, same guard as [`mark_completed`].
pub async fn mark_failed(exec: &mut DbTx<'_>, id: Uuid) -> Result<bool, LedgerError> {
    let result = sqlx::query(
        r#"
        UPDATE transactions
        SET status = 'FAILED', updated_at = NOW()
        WHERE id = $1 AND status = 'PENDING'
        "#,
    )
    .bind(id)
    .execute(&mut **exec)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<TransactionRecord, LedgerError> {
    sqlx::query_as::<_, TransactionRecord>("SELECT * FROM transactions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("transaction {}", id)))
}

/// History for an account (as sender or receiver), newest first.
pub async fn history(
    pool: &PgPool,
    account: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<TransactionRecord>, LedgerError> {
    let records = sqlx::query_as::<_, TransactionRecord>(
        r#"
        SELECT * FROM transactions
        WHERE sender_id = $1 OR receiver_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(account)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

// --- Lightning invoice rows (one-to-one with their transaction) ---

pub async fn insert_invoice(
    exec: &mut DbTx<'_>,
    transaction_id: Uuid,
    payment_request: &str,
) -> Result<LightningInvoice, LedgerError> {
    let invoice = sqlx::query_as::<_, LightningInvoice>(
        r#"
        INSERT INTO lightning_invoices (
            id, transaction_id, payment_request, payment_hash, status,
            created_at, updated_at
        ) VALUES ($1, $2, $3, NULL, 'PENDING', NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(transaction_id)
    .bind(payment_request)
    .fetch_one(&mut **exec)
    .await?;

    Ok(invoice)
}

pub async fn settle_invoice(
    exec: &mut DbTx<'_>,
    transaction_id: Uuid,
    payment_hash: &str,
) -> Result<bool, LedgerError> {
    let result = sqlx::query(
        r#"
        UPDATE lightning_invoices
        SET status = 'PAID', payment_hash = $2, updated_at = NOW()
        WHERE transaction_id = $1 AND status = 'PENDING'
        "#,
    )
    .bind(transaction_id)
    .bind(payment_hash)
    .execute(&mut **exec)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn fail_invoice(exec: &mut DbTx<'_>, transaction_id: Uuid) -> Result<bool, LedgerError> {
    let result = sqlx::query(
        r#"
        UPDATE lightning_invoices
        SET status = 'FAILED', updated_at = NOW()
        WHERE transaction_id = $1 AND status = 'PENDING'
        "#,
    )
    .bind(transaction_id)
    .execute(&mut **exec)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn invoice_by_payment_hash(
    pool: &PgPool,
    payment_hash: &str,
) -> Result<LightningInvoice, LedgerError> {
    sqlx::query_as::<_, LightningInvoice>(
        "SELECT * FROM lightning_invoices WHERE payment_hash = $1",
    )
    .bind(payment_hash)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| LedgerError::NotFound(format!("invoice {}", payment_hash)))
}
