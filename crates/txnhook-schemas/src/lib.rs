//! Wire and storage types shared across the ingestion pipeline.
//!
//! `Transaction` mirrors the `transactions` table row-for-row; the webhook
//! DTOs mirror the inbound/outbound JSON shapes accepted and returned by
//! `txnhook-daemon`'s HTTP surface.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Processing,
    Processed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Processing => "PROCESSING",
            TransactionStatus::Processed => "PROCESSED",
            TransactionStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PROCESSING" => Some(TransactionStatus::Processing),
            "PROCESSED" => Some(TransactionStatus::Processed),
            "FAILED" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

/// A single transaction row as persisted by the Store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub transaction_id: String,
    pub source_account: String,
    pub destination_account: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub payload_hash: String,
    pub duplicate_conflict_count: i32,
    pub last_conflict_at: Option<DateTime<Utc>>,
}

/// Inbound webhook payload for `POST /v1/webhooks/transactions`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionWebhookIn {
    pub transaction_id: String,
    pub source_account: String,
    pub destination_account: String,
    pub amount: Decimal,
    pub currency: String,
}

/// Ack returned from `POST /v1/webhooks/transactions`.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionWebhookAck {
    pub status_code: u16,
    pub acknowledged: bool,
    pub transaction_id: String,
    pub response_time_ms: f64,
}

