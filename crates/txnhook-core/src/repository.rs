//! Repository: the sole legal writer of `Transaction` rows.
//!
//! Every method wraps one `txnhook-db` call in the configured
//! `db_operation_timeout` and converts `anyhow` plumbing errors into
//! [`CoreError::StoreUnavailable`]. Everything above this layer (the
//! Arbiter, the Ingest Service, the Background Processor) depends on
//! `Repository`, never on `txnhook-db` directly.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::time::timeout;
use txnhook_db::NewTransaction;
use txnhook_schemas::Transaction;

use crate::error::CoreError;

#[derive(Clone)]
pub struct Repository {
    pool: PgPool,
    db_operation_timeout: Duration,
}

impl Repository {
    pub fn new(pool: PgPool, db_operation_timeout: Duration) -> Self {
        Self {
            pool,
            db_operation_timeout,
        }
    }

    async fn guarded<T, F>(&self, fut: F) -> Result<T, CoreError>
    where
        F: std::future::Future<Output = anyhow::Result<T>>,
    {
        match timeout(self.db_operation_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CoreError::StoreUnavailable(e.to_string())),
            Err(_) => Err(CoreError::StoreUnavailable("database operation timed out".to_string())),
        }
    }

    pub async fn create_if_not_exists(&self, new: &NewTransaction) -> Result<Option<Transaction>, CoreError> {
        self.guarded(txnhook_db::insert_if_absent(&self.pool, new)).await
    }

    pub async fn get_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Transaction>, CoreError> {
        self.guarded(txnhook_db::get_by_transaction_id(&self.pool, transaction_id))
            .await
    }

    pub async fn record_duplicate_conflict(&self, transaction_id: &str, now: DateTime<Utc>) -> Result<(), CoreError> {
        self.guarded(txnhook_db::record_duplicate_conflict(&self.pool, transaction_id, now))
            .await
    }

    pub async fn mark_for_retry_if_stale(
        &self,
        transaction_id: &str,
        now: DateTime<Utc>,
        stale_timeout: Duration,
    ) -> Result<bool, CoreError> {
        self.guarded(txnhook_db::mark_for_retry_if_stale(
            &self.pool,
            transaction_id,
            now,
            stale_timeout,
        ))
        .await
    }

    pub async fn ensure_processing_started(&self, transaction_id: &str, now: DateTime<Utc>) -> Result<(), CoreError> {
        self.guarded(txnhook_db::ensure_processing_started(&self.pool, transaction_id, now))
            .await
    }

    pub async fn mark_interrupted(&self, transaction_id: &str, message: &str) -> Result<bool, CoreError> {
        self.guarded(txnhook_db::mark_interrupted(&self.pool, transaction_id, message))
            .await
    }

    pub async fn mark_processed(&self, transaction_id: &str, processed_at: DateTime<Utc>) -> Result<bool, CoreError> {
        self.guarded(txnhook_db::mark_processed(&self.pool, transaction_id, processed_at))
            .await
    }

    pub async fn mark_failed(&self, transaction_id: &str, error_message: &str) -> Result<bool, CoreError> {
        self.guarded(txnhook_db::mark_failed(&self.pool, transaction_id, error_message))
            .await
    }
}
