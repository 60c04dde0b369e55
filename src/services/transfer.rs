//! Internal transfers: one atomic unit of work moves value between two
//! accounts and records a COMPLETED transaction. No external dispatch, so
//! there is no PENDING window.

use sqlx::PgPool;
use uuid::Uuid;

use crate::amount::parse_units;
use crate::db::models::{Asset, NewTransaction, TransactionRecord, TxKind, TxStatus};
use crate::db::{accounts, ledger, transactions};
use crate::error::LedgerError;

#[derive(Clone)]
pub struct TransferService {
    pool: PgPool,
}

impl TransferService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn transfer(
        &self,
        sender: Uuid,
        receiver: Uuid,
        asset: Asset,
        amount: &str,
    ) -> Result<TransactionRecord, LedgerError> {
        if sender == receiver {
            return Err(LedgerError::Validation(
                "sender and receiver must differ".to_string(),
            ));
        }
        let units = parse_units(asset, amount)?;

        let mut dbtx = self.pool.begin().await?;
        accounts::ensure_exists(&mut dbtx, sender).await?;
        accounts::ensure_exists(&mut dbtx, receiver).await?;

        // Balance rows are touched in account-id order so two transfers
        // running in opposite directions take their row locks in the same
        // order and cannot deadlock. A credit before a failed reserve rolls
        // back with the rest of the unit of work.
        if sender < receiver {
            ledger::reserve(&mut dbtx, sender, asset, units).await?;
            ledger::credit(&mut dbtx, receiver, asset, units).await?;
        } else {
            ledger::credit(&mut dbtx, receiver, asset, units).await?;
            ledger::reserve(&mut dbtx, sender, asset, units).await?;
        }

        let record = transactions::insert(
            &mut dbtx,
            &NewTransaction {
                sender_id: sender,
                receiver_id: Some(receiver),
                asset,
                amount: units,
                fee: 0,
                kind: TxKind::Internal,
                status: TxStatus::Completed,
            },
        )
        .await?;
        dbtx.commit().await?;

        tracing::info!(
            transaction_id = %record.id,
            %sender,
            %receiver,
            %asset,
            "internal transfer completed"
        );

        Ok(record)
    }
}
