//! Background Processor lifecycle scenarios: normal completion, simulated
//! failure, and shutdown interruption. Requires a live Postgres reachable
//! via `TEST_DATABASE_URL`.
//!
//! Run: TEST_DATABASE_URL=postgres://... cargo test -p txnhook-runtime -- --ignored

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal_macros::dec;
use txnhook_core::{Repository, SystemClock};
use txnhook_db::{testkit_db_pool, NewTransaction};
use txnhook_runtime::{
    schedule_transaction_processing, schedule_transaction_processing_for_test, ShutdownSignal, TaskRegistry,
};

fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

async fn seed_processing_row(repository: &Repository, transaction_id: &str) {
    let new = NewTransaction {
        transaction_id: transaction_id.to_string(),
        source_account: "acc-src".to_string(),
        destination_account: "acc-dst".to_string(),
        amount: dec!(10.00),
        currency: "USD".to_string(),
        processing_started_at: Utc::now(),
        payload_hash: "a".repeat(64),
    };
    repository.create_if_not_exists(&new).await.expect("insert").expect("fresh row");
}

// A fresh row left to run to completion reaches PROCESSED.
#[tokio::test]
#[ignore]
async fn normal_completion_marks_processed() {
    let pool = testkit_db_pool().await.expect("pool");
    let repository = Repository::new(pool, Duration::from_secs(8));
    let txn_id = unique_id("proc-normal");
    seed_processing_row(&repository, &txn_id).await;

    let clock: Arc<dyn txnhook_core::Clock> = Arc::new(SystemClock);
    let shutdown = ShutdownSignal::new();
    let registry = Arc::new(TaskRegistry::new());

    schedule_transaction_processing(
        repository.clone(),
        clock,
        shutdown,
        registry.clone(),
        txn_id.clone(),
        Duration::from_millis(50),
    )
    .await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    let row = repository
        .get_by_transaction_id(&txn_id)
        .await
        .expect("fetch")
        .expect("row exists");
    assert_eq!(row.status.as_str(), "PROCESSED");
    assert!(row.processed_at.is_some());
}

// A processor run with `fail_for_testing` reaches FAILED with a message.
#[tokio::test]
#[ignore]
async fn simulated_failure_marks_failed_with_message() {
    let pool = testkit_db_pool().await.expect("pool");
    let repository = Repository::new(pool, Duration::from_secs(8));
    let txn_id = unique_id("proc-fail");
    seed_processing_row(&repository, &txn_id).await;

    let clock: Arc<dyn txnhook_core::Clock> = Arc::new(SystemClock);
    let shutdown = ShutdownSignal::new();
    let registry = Arc::new(TaskRegistry::new());

    schedule_transaction_processing_for_test(
        repository.clone(),
        clock,
        shutdown,
        registry.clone(),
        txn_id.clone(),
        Duration::from_millis(50),
    )
    .await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    let row = repository
        .get_by_transaction_id(&txn_id)
        .await
        .expect("fetch")
        .expect("row exists");
    assert_eq!(row.status.as_str(), "FAILED");
    assert!(row.error_message.is_some());
    assert!(row.processed_at.is_none());
}

// Shutdown signalled mid-delay leaves the row PROCESSING with
// processing_started_at cleared, never FAILED solely due to shutdown.
#[tokio::test]
#[ignore]
async fn shutdown_during_delay_leaves_row_retryable_not_failed() {
    let pool = testkit_db_pool().await.expect("pool");
    let repository = Repository::new(pool, Duration::from_secs(8));
    let txn_id = unique_id("proc-interrupt");
    seed_processing_row(&repository, &txn_id).await;

    let clock: Arc<dyn txnhook_core::Clock> = Arc::new(SystemClock);
    let shutdown = ShutdownSignal::new();
    let registry = Arc::new(TaskRegistry::new());

    schedule_transaction_processing(
        repository.clone(),
        clock,
        shutdown.clone(),
        registry.clone(),
        txn_id.clone(),
        Duration::from_secs(30),
    )
    .await;

    // Give the task time to load the row and enter the shutdown-vs-delay race.
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.signal();
    registry.drain(Duration::from_secs(5)).await;

    let row = repository
        .get_by_transaction_id(&txn_id)
        .await
        .expect("fetch")
        .expect("row exists");
    assert_eq!(row.status.as_str(), "PROCESSING");
    assert!(row.processing_started_at.is_none());
    assert!(row.error_message.is_some());
}
