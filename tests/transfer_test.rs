mod common;

use common::*;
use ledger_core::db::models::{Asset, TxKind, TxStatus};
use ledger_core::db::transactions;
use ledger_core::error::LedgerError;
use ledger_core::services::TransferService;
use uuid::Uuid;

const USDT_100: u128 = 100_000_000; // 100 USDT at scale 6
const USDT_150: u128 = 150_000_000;

#[tokio::test]
async fn transfer_moves_value_and_records_internal_transaction() {
    let (pool, _container) = setup_db().await;
    let sender = new_account(&pool).await;
    let receiver = new_account(&pool).await;
    fund(&pool, sender, Asset::Usdt, USDT_150).await;

    let service = TransferService::new(pool.clone());
    let record = service
        .transfer(sender, receiver, Asset::Usdt, "100")
        .await
        .unwrap();

    assert_eq!(record.kind, TxKind::Internal);
    assert_eq!(record.status, TxStatus::Completed);
    assert_eq!(record.sender_id, sender);
    assert_eq!(record.receiver_id, Some(receiver));

    assert_eq!(balance(&pool, sender, Asset::Usdt).await, 50_000_000);
    assert_eq!(balance(&pool, receiver, Asset::Usdt).await, USDT_100);
}

#[tokio::test]
async fn transfer_conserves_total_supply() {
    let (pool, _container) = setup_db().await;
    let a = new_account(&pool).await;
    let b = new_account(&pool).await;
    let c = new_account(&pool).await;
    fund(&pool, a, Asset::Btc, 300_000_000).await;

    let service = TransferService::new(pool.clone());
    service.transfer(a, b, Asset::Btc, "1.5").await.unwrap();
    service.transfer(b, c, Asset::Btc, "0.25").await.unwrap();
    service.transfer(c, a, Asset::Btc, "0.1").await.unwrap();

    let total = balance(&pool, a, Asset::Btc).await
        + balance(&pool, b, Asset::Btc).await
        + balance(&pool, c, Asset::Btc).await;
    assert_eq!(total, 300_000_000);
}

#[tokio::test]
async fn insufficient_balance_leaves_ledger_untouched() {
    let (pool, _container) = setup_db().await;
    let sender = new_account(&pool).await;
    let receiver = new_account(&pool).await;
    fund(&pool, sender, Asset::Usdt, 50_000_000).await;

    let service = TransferService::new(pool.clone());
    let result = service.transfer(sender, receiver, Asset::Usdt, "100").await;

    assert!(matches!(
        result,
        Err(LedgerError::InsufficientFunds { asset: Asset::Usdt })
    ));
    assert_eq!(balance(&pool, sender, Asset::Usdt).await, 50_000_000);
    assert_eq!(balance(&pool, receiver, Asset::Usdt).await, 0);
    assert!(transactions::history(&pool, sender, 10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_account_is_rejected() {
    let (pool, _container) = setup_db().await;
    let sender = new_account(&pool).await;
    fund(&pool, sender, Asset::Btc, 100_000_000).await;

    let service = TransferService::new(pool.clone());
    let ghost = Uuid::new_v4();
    let result = service.transfer(sender, ghost, Asset::Btc, "0.5").await;

    assert!(matches!(result, Err(LedgerError::AccountNotFound(id)) if id == ghost));
    assert_eq!(balance(&pool, sender, Asset::Btc).await, 100_000_000);
}

#[tokio::test]
async fn self_transfer_is_rejected() {
    let (pool, _container) = setup_db().await;
    let account = new_account(&pool).await;
    fund(&pool, account, Asset::Btc, 100_000_000).await;

    let service = TransferService::new(pool.clone());
    let result = service.transfer(account, account, Asset::Btc, "0.5").await;
    assert!(matches!(result, Err(LedgerError::Validation(_))));
}

#[tokio::test]
async fn concurrent_transfers_cannot_overdraw() {
    let (pool, _container) = setup_db().await;
    let sender = new_account(&pool).await;
    let receiver = new_account(&pool).await;
    fund(&pool, sender, Asset::Usdt, USDT_100).await;

    // Two racing debits of 80 against a balance of 100: exactly one may win.
    let service = TransferService::new(pool.clone());
    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.transfer(sender, receiver, Asset::Usdt, "80").await })
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move { service.transfer(sender, receiver, Asset::Usdt, "80").await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    assert_eq!(balance(&pool, sender, Asset::Usdt).await, 20_000_000);
    assert_eq!(balance(&pool, receiver, Asset::Usdt).await, 80_000_000);
}

#[tokio::test]
async fn opposite_direction_transfers_do_not_deadlock() {
    let (pool, _container) = setup_db().await;
    let a = new_account(&pool).await;
    let b = new_account(&pool).await;
    fund(&pool, a, Asset::Usdt, USDT_100).await;
    fund(&pool, b, Asset::Usdt, USDT_100).await;

    // Row locks are taken in account-id order, so A->B and B->A running
    // concurrently must both commit rather than abort on a lock cycle.
    let service = TransferService::new(pool.clone());
    let forward = {
        let service = service.clone();
        tokio::spawn(async move {
            for _ in 0..10 {
                service.transfer(a, b, Asset::Usdt, "1").await?;
            }
            Ok::<_, ledger_core::error::LedgerError>(())
        })
    };
    let backward = {
        let service = service.clone();
        tokio::spawn(async move {
            for _ in 0..10 {
                service.transfer(b, a, Asset::Usdt, "1").await?;
            }
            Ok::<_, ledger_core::error::LedgerError>(())
        })
    };

    forward.await.unwrap().unwrap();
    backward.await.unwrap().unwrap();

    assert_eq!(balance(&pool, a, Asset::Usdt).await, USDT_100);
    assert_eq!(balance(&pool, b, Asset::Usdt).await, USDT_100);
}

#[tokio::test]
async fn history_is_newest_first_for_both_directions() {
    let (pool, _container) = setup_db().await;
    let a = new_account(&pool).await;
    let b = new_account(&pool).await;
    fund(&pool, a, Asset::Btc, 100_000_000).await;

    let service = TransferService::new(pool.clone());
    let first = service.transfer(a, b, Asset::Btc, "0.2").await.unwrap();
    let second = service.transfer(b, a, Asset::Btc, "0.1").await.unwrap();

    let seen_by_a = transactions::history(&pool, a, 10, 0).await.unwrap();
    assert_eq!(seen_by_a.len(), 2);
    assert_eq!(seen_by_a[0].id, second.id);
    assert_eq!(seen_by_a[1].id, first.id);

    let seen_by_b = transactions::history(&pool, b, 10, 0).await.unwrap();
    assert_eq!(seen_by_b.len(), 2);
}
