//! Shared test fixtures for the ingestion pipeline's scenario tests.
//!
//! Kept out of every production crate's `[dependencies]` (only ever pulled
//! in via `[dev-dependencies]`) so none of it leaks into the daemon binary.

use std::sync::Mutex;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use txnhook_core::Clock;
use txnhook_schemas::TransactionWebhookIn;

/// A fresh `transaction_id`-shaped string, unique per call, for tests that
/// need to avoid colliding with rows left behind by earlier runs against
/// the same database.
pub fn unique_transaction_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

/// A syntactically valid webhook payload with the given transaction id and
/// amount; the rest of the fields are fixed placeholders.
pub fn sample_webhook_payload(transaction_id: &str, amount: Decimal) -> TransactionWebhookIn {
    TransactionWebhookIn {
        transaction_id: transaction_id.to_string(),
        source_account: "acc_user_789".to_string(),
        destination_account: "acc_merchant_456".to_string(),
        amount,
        currency: "INR".to_string(),
    }
}

/// Deletes every row from `transactions`. For use between scenario tests
/// that share a database but need a clean slate; unused by tests that
/// instead scope themselves with unique transaction ids.
pub async fn truncate_transactions(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query("truncate table transactions").execute(pool).await?;
    Ok(())
}

/// Clock that always returns a fixed instant until explicitly advanced.
/// Lets stale-timeout math around `mark_for_retry_if_stale` be tested
/// deterministically instead of racing a real timer.
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Mutex::new(at))
    }

    pub fn advance(&self, delta: ChronoDuration) {
        let mut guard = self.0.lock().unwrap();
        *guard += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}
