//! Idempotency Arbiter: classifies a webhook delivery as fresh, a
//! same-payload duplicate, or a conflicting duplicate, and decides whether
//! the Background Processor should be (re)scheduled for it.

use std::time::Duration;

use tracing::warn;
use txnhook_db::NewTransaction;
use txnhook_schemas::Transaction;

use crate::clock::Clock;
use crate::error::CoreError;
use crate::hash::canonical_hash;
use crate::repository::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterOutcome {
    /// First delivery for this `transaction_id`; the row was just created.
    Fresh,
    /// A delivery for a known `transaction_id` whose canonical payload
    /// matches the stored hash exactly.
    SameDuplicate,
    /// A delivery for a known `transaction_id` whose canonical payload
    /// differs from the stored hash. The original payload is never
    /// overwritten; only conflict metadata is recorded.
    ConflictingDuplicate,
}

pub struct ArbiterResult {
    pub outcome: ArbiterOutcome,
    pub transaction: Transaction,
    pub should_schedule: bool,
}

/// Attempt the insert first; only fall back to a read if the unique
/// constraint already holds a row for this `transaction_id`. This ordering
/// is what makes the insert-then-fetch race safe under concurrent delivery.
pub async fn arbitrate(
    repository: &Repository,
    clock: &dyn Clock,
    stale_timeout: Duration,
    new: &NewTransaction,
    payload_for_hash: &txnhook_schemas::TransactionWebhookIn,
) -> Result<ArbiterResult, CoreError> {
    if let Some(created) = repository.create_if_not_exists(new).await? {
        return Ok(ArbiterResult {
            outcome: ArbiterOutcome::Fresh,
            transaction: created,
            should_schedule: true,
        });
    }

    let now = clock.now();
    let existing = repository
        .get_by_transaction_id(&new.transaction_id)
        .await?
        .ok_or_else(|| {
            CoreError::InternalInconsistency(format!(
                "transaction {} disappeared after conflict check",
                new.transaction_id
            ))
        })?;

    let incoming_hash = canonical_hash(payload_for_hash);
    let outcome = if existing.payload_hash == incoming_hash {
        ArbiterOutcome::SameDuplicate
    } else {
        warn!(
            transaction_id = %new.transaction_id,
            existing_payload_hash = %existing.payload_hash,
            new_payload_hash = %incoming_hash,
            "webhook delivered with duplicate transaction_id but different payload",
        );
        repository.record_duplicate_conflict(&new.transaction_id, now).await?;
        ArbiterOutcome::ConflictingDuplicate
    };

    let should_schedule = repository
        .mark_for_retry_if_stale(&new.transaction_id, now, stale_timeout)
        .await?;

    let transaction = if should_schedule {
        repository
            .get_by_transaction_id(&new.transaction_id)
            .await?
            .unwrap_or(existing)
    } else {
        existing
    };

    Ok(ArbiterResult {
        outcome,
        transaction,
        should_schedule,
    })
}
