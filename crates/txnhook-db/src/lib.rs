//! Postgres-backed Store for the `transactions` table.
//!
//! Every function here checks out its own connection from the pool and
//! issues exactly the statements it needs; no session is held open across
//! an `.await` boundary that isn't a direct database call. Callers above
//! this crate (the Repository in `txnhook-core`) own retry/timeout policy.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use txnhook_schemas::{Transaction, TransactionStatus};

/// Connect to Postgres with an explicit pool configuration.
pub async fn connect(database_url: &str, max_connections: u32, recycle: Duration) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .max_lifetime(recycle)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")?;
    Ok(pool)
}

/// Test helper: connect using `TEST_DATABASE_URL` and ensure migrations are applied.
pub async fn testkit_db_pool() -> Result<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL")
        .context("missing env var TEST_DATABASE_URL")?;
    let pool = connect(&url, 5, Duration::from_secs(1800)).await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Basic connectivity check, used by the health probe and startup bootstrap.
pub async fn check_connection(pool: &PgPool) -> Result<()> {
    sqlx::query("select 1")
        .execute(pool)
        .await
        .context("db connectivity check failed")?;
    Ok(())
}

/// Fields required to attempt a first insert of a transaction row.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub transaction_id: String,
    pub source_account: String,
    pub destination_account: String,
    pub amount: Decimal,
    pub currency: String,
    pub processing_started_at: DateTime<Utc>,
    pub payload_hash: String,
}

fn row_to_transaction(row: sqlx::postgres::PgRow) -> Result<Transaction> {
    let status_str: String = row.try_get("status")?;
    let status = TransactionStatus::parse(&status_str)
        .with_context(|| format!("unrecognized transaction status in row: {status_str}"))?;
    Ok(Transaction {
        id: row.try_get("id")?,
        transaction_id: row.try_get("transaction_id")?,
        source_account: row.try_get("source_account")?,
        destination_account: row.try_get("destination_account")?,
        amount: row.try_get("amount")?,
        currency: row.try_get("currency")?,
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        processing_started_at: row.try_get("processing_started_at")?,
        processed_at: row.try_get("processed_at")?,
        error_message: row.try_get("error_message")?,
        payload_hash: row.try_get("payload_hash")?,
        duplicate_conflict_count: row.try_get("duplicate_conflict_count")?,
        last_conflict_at: row.try_get("last_conflict_at")?,
    })
}

const SELECT_COLUMNS: &str = "id, transaction_id, source_account, destination_account, amount, \
    currency, status, created_at, updated_at, processing_started_at, processed_at, \
    error_message, payload_hash, duplicate_conflict_count, last_conflict_at";

/// First-delivery-wins insert. Returns `None` if a row with this
/// `transaction_id` already exists; the caller distinguishes fresh vs.
/// duplicate deliveries entirely from this return value.
pub async fn insert_if_absent(pool: &PgPool, new: &NewTransaction) -> Result<Option<Transaction>> {
    let row = sqlx::query(&format!(
        r#"
        insert into transactions (
            transaction_id, source_account, destination_account, amount,
            currency, status, processing_started_at, payload_hash
        ) values (
            $1, $2, $3, $4, $5, 'PROCESSING', $6, $7
        )
        on conflict (transaction_id) do nothing
        returning {SELECT_COLUMNS}
        "#
    ))
    .bind(&new.transaction_id)
    .bind(&new.source_account)
    .bind(&new.destination_account)
    .bind(new.amount)
    .bind(&new.currency)
    .bind(new.processing_started_at)
    .bind(&new.payload_hash)
    .fetch_optional(pool)
    .await
    .context("insert_if_absent failed")?;

    row.map(row_to_transaction).transpose()
}

/// Fetch a transaction row by its external `transaction_id`.
pub async fn get_by_transaction_id(pool: &PgPool, transaction_id: &str) -> Result<Option<Transaction>> {
    let row = sqlx::query(&format!(
        "select {SELECT_COLUMNS} from transactions where transaction_id = $1"
    ))
    .bind(transaction_id)
    .fetch_optional(pool)
    .await
    .context("get_by_transaction_id failed")?;

    row.map(row_to_transaction).transpose()
}

/// Best-effort conflict bookkeeping: always increments the counter and
/// bumps `last_conflict_at`, regardless of the row's current status.
pub async fn record_duplicate_conflict(pool: &PgPool, transaction_id: &str, now: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        r#"
        update transactions
           set duplicate_conflict_count = duplicate_conflict_count + 1,
               last_conflict_at = $2
         where transaction_id = $1
        "#,
    )
    .bind(transaction_id)
    .bind(now)
    .execute(pool)
    .await
    .context("record_duplicate_conflict failed")?;
    Ok(())
}

/// Re-open a stuck `PROCESSING` row for retry if it has no terminal
/// timestamp and its processing start is either unset or older than
/// `stale_timeout`. Single conditional `UPDATE`; returns whether it fired.
pub async fn mark_for_retry_if_stale(
    pool: &PgPool,
    transaction_id: &str,
    now: DateTime<Utc>,
    stale_timeout: Duration,
) -> Result<bool> {
    let stale_cutoff = now - chrono::Duration::from_std(stale_timeout).unwrap_or_default();
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        update transactions
           set processing_started_at = $2,
               error_message = null
         where transaction_id = $1
           and status = 'PROCESSING'
           and processed_at is null
           and (processing_started_at is null or processing_started_at < $3)
        returning id
        "#,
    )
    .bind(transaction_id)
    .bind(now)
    .bind(stale_cutoff)
    .fetch_optional(pool)
    .await
    .context("mark_for_retry_if_stale failed")?;

    Ok(row.is_some())
}

/// Stamp `processing_started_at` once, if it has not already been set.
pub async fn ensure_processing_started(pool: &PgPool, transaction_id: &str, now: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        r#"
        update transactions
           set processing_started_at = $2
         where transaction_id = $1
           and processing_started_at is null
        "#,
    )
    .bind(transaction_id)
    .bind(now)
    .execute(pool)
    .await
    .context("ensure_processing_started failed")?;
    Ok(())
}

/// Leave a `PROCESSING` row retryable after a shutdown interrupts it.
/// Returns whether a row was still `PROCESSING` (and therefore mutated).
pub async fn mark_interrupted(pool: &PgPool, transaction_id: &str, message: &str) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        update transactions
           set processing_started_at = null,
               error_message = $2
         where transaction_id = $1
           and status = 'PROCESSING'
        returning id
        "#,
    )
    .bind(transaction_id)
    .bind(message)
    .fetch_optional(pool)
    .await
    .context("mark_interrupted failed")?;
    Ok(row.is_some())
}

/// Terminal transition to `PROCESSED`. Gated on the row still being
/// `PROCESSING` so a late retry or concurrent processor can't clobber a
/// row that already reached a terminal state.
pub async fn mark_processed(pool: &PgPool, transaction_id: &str, processed_at: DateTime<Utc>) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        update transactions
           set status = 'PROCESSED',
               processed_at = $2,
               error_message = null
         where transaction_id = $1
           and status = 'PROCESSING'
        returning id
        "#,
    )
    .bind(transaction_id)
    .bind(processed_at)
    .fetch_optional(pool)
    .await
    .context("mark_processed failed")?;
    Ok(row.is_some())
}

/// Terminal transition to `FAILED`. Same guard as [`mark_processed`].
pub async fn mark_failed(pool: &PgPool, transaction_id: &str, error_message: &str) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        update transactions
           set status = 'FAILED',
               error_message = $2
         where transaction_id = $1
           and status = 'PROCESSING'
        returning id
        "#,
    )
    .bind(transaction_id)
    .bind(error_message)
    .fetch_optional(pool)
    .await
    .context("mark_failed failed")?;
    Ok(row.is_some())
}
