//! Requires a live Postgres reachable via TEST_DATABASE_URL.
//! Run: TEST_DATABASE_URL=postgres://... cargo test -p txnhook-db -- --ignored

use chrono::Utc;
use rust_decimal_macros::dec;
use txnhook_db::{get_by_transaction_id, insert_if_absent, mark_processed, testkit_db_pool, NewTransaction};

fn sample(transaction_id: &str) -> NewTransaction {
    NewTransaction {
        transaction_id: transaction_id.to_string(),
        source_account: "ACC-SRC-1".to_string(),
        destination_account: "ACC-DST-1".to_string(),
        amount: dec!(1500.00),
        currency: "INR".to_string(),
        processing_started_at: Utc::now(),
        payload_hash: "deadbeef".repeat(8),
    }
}

#[tokio::test]
#[ignore]
async fn second_insert_with_same_id_returns_none() {
    let pool = testkit_db_pool().await.expect("pool");
    let txn_id = format!("scenario-insert-idempotent-{}", Utc::now().timestamp_nanos_opt().unwrap());

    let first = insert_if_absent(&pool, &sample(&txn_id)).await.expect("first insert");
    assert!(first.is_some());

    let second = insert_if_absent(&pool, &sample(&txn_id)).await.expect("second insert");
    assert!(second.is_none(), "duplicate transaction_id must not create a second row");
}

#[tokio::test]
#[ignore]
async fn mark_processed_only_fires_from_processing() {
    let pool = testkit_db_pool().await.expect("pool");
    let txn_id = format!("scenario-mark-processed-{}", Utc::now().timestamp_nanos_opt().unwrap());

    insert_if_absent(&pool, &sample(&txn_id)).await.expect("insert").expect("fresh row");

    let fired = mark_processed(&pool, &txn_id, Utc::now()).await.expect("mark_processed");
    assert!(fired);

    // Second call finds the row already PROCESSED, not PROCESSING, so it must not fire again.
    let fired_again = mark_processed(&pool, &txn_id, Utc::now()).await.expect("mark_processed again");
    assert!(!fired_again);

    let row = get_by_transaction_id(&pool, &txn_id).await.expect("fetch").expect("row exists");
    assert_eq!(row.status.as_str(), "PROCESSED");
}
