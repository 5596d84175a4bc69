//! Ingest Service: validates an inbound webhook payload and drives it
//! through the Idempotency Arbiter, producing the `(transaction_id,
//! should_schedule)` pair the HTTP layer needs to ack and optionally
//! schedule background processing.

use std::time::Duration;

use rust_decimal::Decimal;
use txnhook_db::NewTransaction;
use txnhook_schemas::TransactionWebhookIn;

use crate::arbiter::{arbitrate, ArbiterOutcome};
use crate::clock::Clock;
use crate::error::CoreError;
use crate::repository::Repository;

const MAX_IDENTIFIER_LEN: usize = 128;
const MAX_CURRENCY_LEN: usize = 3;

pub struct IngestOutcome {
    pub transaction_id: String,
    pub should_schedule: bool,
    pub arbiter_outcome: ArbiterOutcome,
}

pub struct IngestService<'a> {
    repository: &'a Repository,
    clock: &'a dyn Clock,
    processing_stale_timeout: Duration,
    deadline: Duration,
}

impl<'a> IngestService<'a> {
    /// `deadline` bounds the whole ingest operation (default 8s per
    /// `DB_OPERATION_TIMEOUT_SECONDS`), on top of the per-call timeouts the
    /// `Repository` already applies to each Store round-trip; it is what
    /// catches a slow sequence of otherwise-individually-fast calls.
    pub fn new(repository: &'a Repository, clock: &'a dyn Clock, processing_stale_timeout: Duration) -> Self {
        Self::with_deadline(repository, clock, processing_stale_timeout, Duration::from_secs(8))
    }

    pub fn with_deadline(
        repository: &'a Repository,
        clock: &'a dyn Clock,
        processing_stale_timeout: Duration,
        deadline: Duration,
    ) -> Self {
        Self {
            repository,
            clock,
            processing_stale_timeout,
            deadline,
        }
    }

    pub async fn ingest(&self, payload: TransactionWebhookIn) -> Result<IngestOutcome, CoreError> {
        match tokio::time::timeout(self.deadline, self.ingest_inner(payload)).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::StoreUnavailable(
                "ingest did not complete within the configured deadline".to_string(),
            )),
        }
    }

    async fn ingest_inner(&self, payload: TransactionWebhookIn) -> Result<IngestOutcome, CoreError> {
        let normalized = validate(payload)?;

        let now = self.clock.now();
        let new = NewTransaction {
            transaction_id: normalized.transaction_id.clone(),
            source_account: normalized.source_account.clone(),
            destination_account: normalized.destination_account.clone(),
            amount: normalized.amount,
            currency: normalized.currency.clone(),
            processing_started_at: now,
            payload_hash: crate::hash::canonical_hash(&normalized),
        };

        let result = arbitrate(
            self.repository,
            self.clock,
            self.processing_stale_timeout,
            &new,
            &normalized,
        )
        .await?;

        Ok(IngestOutcome {
            transaction_id: result.transaction.transaction_id,
            should_schedule: result.should_schedule,
            arbiter_outcome: result.outcome,
        })
    }
}

fn validate(payload: TransactionWebhookIn) -> Result<TransactionWebhookIn, CoreError> {
    let transaction_id = require_identifier(&payload.transaction_id, "transaction_id")?;
    let source_account = require_identifier(&payload.source_account, "source_account")?;
    let destination_account = require_identifier(&payload.destination_account, "destination_account")?;

    if payload.amount <= Decimal::ZERO {
        return Err(CoreError::ValidationError("amount must be greater than zero".to_string()));
    }

    let currency = payload.currency.trim().to_uppercase();
    if currency.chars().count() != MAX_CURRENCY_LEN {
        return Err(CoreError::ValidationError(
            "currency must be exactly 3 characters".to_string(),
        ));
    }

    Ok(TransactionWebhookIn {
        transaction_id,
        source_account,
        destination_account,
        amount: payload.amount,
        currency,
    })
}

fn require_identifier(value: &str, field: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::ValidationError(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(CoreError::ValidationError(format!(
            "{field} must be at most {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> TransactionWebhookIn {
        TransactionWebhookIn {
            transaction_id: " txn-1 ".to_string(),
            source_account: "acc-a".to_string(),
            destination_account: "acc-b".to_string(),
            amount: dec!(100),
            currency: " inr ".to_string(),
        }
    }

    #[test]
    fn rejects_non_positive_amount() {
        let mut p = sample();
        p.amount = dec!(0);
        assert!(matches!(validate(p), Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn rejects_wrong_length_currency() {
        let mut p = sample();
        p.currency = "US".to_string();
        assert!(matches!(validate(p), Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn trims_and_uppercases_on_success() {
        let normalized = validate(sample()).expect("valid payload");
        assert_eq!(normalized.transaction_id, "txn-1");
        assert_eq!(normalized.currency, "INR");
    }

    #[test]
    fn rejects_blank_identifier() {
        let mut p = sample();
        p.source_account = "   ".to_string();
        assert!(matches!(validate(p), Err(CoreError::ValidationError(_))));
    }
}
