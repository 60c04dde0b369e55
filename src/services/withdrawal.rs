//! Withdrawal orchestration.
//!
//! A withdrawal moves through VALIDATED -> RESERVED -> DISPATCHED and ends
//! SETTLED (record COMPLETED) or REFUNDED (record FAILED). The reservation
//! commits in its own unit of work before any external call, so the attempt
//! is durable even if the process dies mid-dispatch. External sends are
//! never retried here; an unknown outcome is for the reconciliation job to
//! resolve against the stored external reference.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::amount::parse_units;
use crate::db::models::{Asset, NewTransaction, TransactionRecord, TxKind, TxStatus};
use crate::db::{accounts, ledger, transactions};
use crate::error::LedgerError;
use crate::providers::{LightningGateway, ProviderRegistry};
use crate::services::fees::{FeeEstimator, FeeTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    Onchain,
    Lightning,
}

#[derive(Clone)]
pub struct WithdrawalService {
    pool: PgPool,
    providers: ProviderRegistry,
    lightning: Arc<dyn LightningGateway>,
    fees: FeeEstimator,
}

impl WithdrawalService {
    pub fn new(
        pool: PgPool,
        providers: ProviderRegistry,
        lightning: Arc<dyn LightningGateway>,
        fees: FeeEstimator,
    ) -> Self {
        Self {
            pool,
            providers,
            lightning,
            fees,
        }
    }

    pub async fn withdraw(
        &self,
        account: Uuid,
        asset: Asset,
        amount: &str,
        destination: &str,
        tier: FeeTier,
        channel: Channel,
    ) -> Result<TransactionRecord, LedgerError> {
        if channel == Channel::Lightning && asset != Asset::Btc {
            return Err(LedgerError::Unsupported(
                "Lightning Network is only available for BTC".to_string(),
            ));
        }

        let units = parse_units(asset, amount)?;

        // The provider resolved here is the one that dispatches later, so a
        // withdrawal that passed validation can never fail a second lookup
        // with funds already reserved.
        let provider = match channel {
            Channel::Onchain => {
                let provider = self.providers.get(asset)?;
                if !provider.validate_address(destination) {
                    return Err(LedgerError::InvalidAddress { asset });
                }
                Some(provider)
            }
            Channel::Lightning => {
                if !self.lightning.validate_invoice(destination).await {
                    return Err(LedgerError::InvalidAddress { asset });
                }
                None
            }
        };

        let fee = self.fees.fee_units(asset, tier).await?;
        let reserved = units
            .checked_add(fee)
            .ok_or_else(|| LedgerError::Validation("amount out of range".to_string()))?;

        // Unit of work #1: reserve funds and record the attempt. Once this
        // commits the withdrawal cannot be cancelled; it runs to SETTLED or
        // REFUNDED.
        let mut dbtx = self.pool.begin().await?;
        accounts::ensure_exists(&mut dbtx, account).await?;
        ledger::reserve(&mut dbtx, account, asset, reserved).await?;

        let kind = match channel {
            Channel::Onchain => TxKind::Withdrawal,
            Channel::Lightning => TxKind::Lightning,
        };
        let record = transactions::insert(
            &mut dbtx,
            &NewTransaction {
                sender_id: account,
                receiver_id: None,
                asset,
                amount: units,
                fee,
                kind,
                status: TxStatus::Pending,
            },
        )
        .await?;
        if channel == Channel::Lightning {
            transactions::insert_invoice(&mut dbtx, record.id, destination).await?;
        }
        dbtx.commit().await?;

        tracing::info!(
            transaction_id = %record.id,
            %account,
            %asset,
            units,
            fee,
            ?channel,
            "withdrawal reserved, dispatching"
        );

        // Dispatch outside any DB transaction. No retry: a blind retry after
        // an unknown outcome risks paying twice.
        let dispatched: Result<String, anyhow::Error> = match &provider {
            Some(provider) => provider
                .send(destination, units, fee)
                .await
                .map_err(Into::into),
            None => self
                .lightning
                .pay_invoice(destination)
                .await
                .map_err(Into::into),
        };

        match dispatched {
            Ok(external_ref) => self.settle(record.id, &external_ref, channel).await,
            Err(cause) => {
                tracing::warn!(
                    transaction_id = %record.id,
                    error = %cause,
                    "dispatch failed, compensating"
                );
                self.compensate(record.id, account, asset, reserved, channel)
                    .await?;
                Err(LedgerError::WithdrawalFailed {
                    transaction_id: record.id,
                    source: cause,
                })
            }
        }
    }

    /// Unit of work #2 on success: PENDING -> COMPLETED plus the external
    /// reference. A record that already left PENDING is left untouched.
    async fn settle(
        &self,
        id: Uuid,
        external_ref: &str,
        channel: Channel,
    ) -> Result<TransactionRecord, LedgerError> {
        let outcome: Result<(), LedgerError> = async {
            let mut dbtx = self.pool.begin().await?;
            let transitioned = transactions::mark_completed(&mut dbtx, id, external_ref).await?;
            if transitioned && channel == Channel::Lightning {
                transactions::settle_invoice(&mut dbtx, id, external_ref).await?;
            }
            dbtx.commit().await?;
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => transactions::get(&self.pool, id).await,
            Err(error) => {
                // The external payment went out but the ledger could not be
                // closed; only the reconciliation job may resolve this.
                tracing::error!(
                    transaction_id = %id,
                    external_ref,
                    %error,
                    "settlement unit failed after successful dispatch"
                );
                Err(LedgerError::ReconciliationRequired { transaction_id: id })
            }
        }
    }

    /// Compensating unit after a failed dispatch: PENDING -> FAILED and the
    /// full reservation credited back. The refund only runs when this call
    /// actually performed the transition, so concurrent attempts cannot
    /// double-credit.
    async fn compensate(
        &self,
        id: Uuid,
        account: Uuid,
        asset: Asset,
        reserved: u128,
        channel: Channel,
    ) -> Result<(), LedgerError> {
        let outcome: Result<(), LedgerError> = async {
            let mut dbtx = self.pool.begin().await?;
            let transitioned = transactions::mark_failed(&mut dbtx, id).await?;
            if transitioned {
                if channel == Channel::Lightning {
                    transactions::fail_invoice(&mut dbtx, id).await?;
                }
                ledger::refund(&mut dbtx, account, asset, reserved).await?;
            }
            dbtx.commit().await?;
            Ok(())
        }
        .await;

        outcome.map_err(|error| {
            tracing::error!(
                transaction_id = %id,
                %error,
                "compensation unit failed after dispatch failure"
            );
            LedgerError::ReconciliationRequired { transaction_id: id }
        })
    }
}
