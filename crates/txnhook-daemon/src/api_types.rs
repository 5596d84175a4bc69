//! Request/response wire types specific to the HTTP surface.
//!
//! DTOs shared with the storage layer (`Transaction`, `TransactionWebhookIn`,
//! `TransactionWebhookAck`) live in `txnhook-schemas`; this module only holds
//! types that exist purely to shape an HTTP response, plus the localized
//! timestamp presentation the lookup and health routes need.

use chrono_tz::Tz;
use serde::Serialize;
use txnhook_schemas::Transaction;

/// JSON error body returned for every non-2xx response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Body for `GET /`.
///
/// `current_time` is rendered in the configured display timezone (default
/// `Asia/Kolkata`), not UTC — storage stays timestamp-with-zone, only the
/// presentation layer localizes.
#[derive(Debug, Clone, Serialize)]
pub struct HealthProbeResponse {
    pub status: &'static str,
    pub current_time: String,
}

/// One row as returned by `GET /v1/transactions/{transaction_id}`.
///
/// Timestamps are ISO-8601 strings in the display timezone, per the list
/// (not single-object) response contract clients rely on; see DESIGN.md
/// for why the list form was chosen over a conventional 404.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub source_account: String,
    pub destination_account: String,
    pub amount: rust_decimal::Decimal,
    pub currency: String,
    pub status: &'static str,
    pub created_at: String,
    pub processed_at: Option<String>,
}

impl TransactionRecord {
    pub fn localize(transaction: &Transaction, tz: Tz) -> Self {
        Self {
            transaction_id: transaction.transaction_id.clone(),
            source_account: transaction.source_account.clone(),
            destination_account: transaction.destination_account.clone(),
            amount: transaction.amount,
            currency: transaction.currency.clone(),
            status: transaction.status.as_str(),
            created_at: transaction.created_at.with_timezone(&tz).to_rfc3339(),
            processed_at: transaction
                .processed_at
                .map(|ts| ts.with_timezone(&tz).to_rfc3339()),
        }
    }
}
