//! Background Processor: drives one scheduled transaction from `PROCESSING`
//! to a terminal state, or leaves it retryable if shutdown interrupts it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use txnhook_core::{Clock, Repository};
use txnhook_schemas::TransactionStatus;

use crate::registry::TaskRegistry;
use crate::shutdown::ShutdownSignal;

/// Spawn the processing task for `transaction_id` and register its handle
/// so shutdown can await (or abort) it. Mirrors the fire-and-forget
/// scheduling the webhook handler relies on to keep its own response time
/// independent of `processing_delay`.
pub async fn schedule_transaction_processing(
    repository: Repository,
    clock: Arc<dyn Clock>,
    shutdown: ShutdownSignal,
    registry: Arc<TaskRegistry>,
    transaction_id: String,
    processing_delay: Duration,
) {
    schedule_transaction_processing_inner(repository, clock, shutdown, registry, transaction_id, processing_delay, false).await
}

/// Test-only entry point that forces the simulated-failure path after the
/// processing delay elapses, used to exercise the `FAILED` terminal state
/// deterministically. Never reachable from the HTTP surface.
pub async fn schedule_transaction_processing_for_test(
    repository: Repository,
    clock: Arc<dyn Clock>,
    shutdown: ShutdownSignal,
    registry: Arc<TaskRegistry>,
    transaction_id: String,
    processing_delay: Duration,
) {
    schedule_transaction_processing_inner(repository, clock, shutdown, registry, transaction_id, processing_delay, true).await
}

async fn schedule_transaction_processing_inner(
    repository: Repository,
    clock: Arc<dyn Clock>,
    shutdown: ShutdownSignal,
    registry: Arc<TaskRegistry>,
    transaction_id: String,
    processing_delay: Duration,
    fail_for_testing: bool,
) {
    let handle = tokio::spawn(async move {
        process_transaction(&repository, clock.as_ref(), &shutdown, &transaction_id, processing_delay, fail_for_testing).await;
    });
    registry.register(handle).await;
}

async fn process_transaction(
    repository: &Repository,
    clock: &dyn Clock,
    shutdown: &ShutdownSignal,
    transaction_id: &str,
    processing_delay: Duration,
    fail_for_testing: bool,
) {
    let transaction = match repository.get_by_transaction_id(transaction_id).await {
        Ok(Some(t)) => t,
        Ok(None) => return,
        Err(e) => {
            error!(transaction_id, error = %e, "failed to load transaction before processing");
            return;
        }
    };
    if transaction.status != TransactionStatus::Processing {
        return;
    }

    if let Err(e) = repository.ensure_processing_started(transaction_id, clock.now()).await {
        error!(transaction_id, error = %e, "failed to stamp processing_started_at");
        return;
    }

    tokio::select! {
        _ = shutdown.notified() => {
            match repository.mark_interrupted(
                transaction_id,
                "Processing interrupted by shutdown; eligible for retry",
            ).await {
                Ok(true) => info!(transaction_id, "processing interrupted by shutdown, left retryable"),
                Ok(false) => {}
                Err(e) => error!(transaction_id, error = %e, "failed to mark transaction interrupted"),
            }
            return;
        }
        _ = tokio::time::sleep(processing_delay) => {}
    }

    if fail_for_testing {
        fail(repository, transaction_id, "Simulated processing failure").await;
        return;
    }

    match repository.mark_processed(transaction_id, clock.now()).await {
        Ok(true) => info!(transaction_id, "transaction processed"),
        Ok(false) => {}
        Err(e) => {
            warn!(transaction_id, error = %e, "mark_processed failed, recording as failure");
            fail(repository, transaction_id, &e.to_string()).await;
        }
    }
}

async fn fail(repository: &Repository, transaction_id: &str, message: &str) {
    match repository.mark_failed(transaction_id, message).await {
        Ok(_) => {}
        Err(e) => error!(transaction_id, error = %e, "failed to persist processing failure"),
    }
}
