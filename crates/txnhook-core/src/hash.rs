//! Canonical payload hashing for idempotency comparison.
//!
//! Builds a five-field canonical mapping from the payload's identifying
//! fields, serializes it with keys sorted, and hashes with SHA-256. This lets
//! `1500`, `1500.0`, and `1500.00` all hash identically, since the amount is
//! always rendered to exactly two fractional digits before hashing.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use txnhook_schemas::TransactionWebhookIn;

pub fn canonical_hash(payload: &TransactionWebhookIn) -> String {
    let canonical = canonical_payload(payload);
    let serialized = serde_json::to_string(&sort_keys(&canonical)).expect("canonical map serializes");
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    hex::encode(hasher.finalize())
}

fn canonical_payload(payload: &TransactionWebhookIn) -> Value {
    let mut map = Map::new();
    map.insert(
        "transaction_id".to_string(),
        Value::String(payload.transaction_id.trim().to_string()),
    );
    map.insert(
        "source_account".to_string(),
        Value::String(payload.source_account.trim().to_string()),
    );
    map.insert(
        "destination_account".to_string(),
        Value::String(payload.destination_account.trim().to_string()),
    );
    map.insert(
        "amount".to_string(),
        Value::String(format!("{:.2}", payload.amount)),
    );
    map.insert(
        "currency".to_string(),
        Value::String(payload.currency.trim().to_uppercase()),
    );
    Value::Object(map)
}

/// Recursively sort object keys so serialization order is deterministic.
fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut sorted = Map::new();
            for k in keys {
                sorted.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(sorted)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payload(amount: rust_decimal::Decimal) -> TransactionWebhookIn {
        TransactionWebhookIn {
            transaction_id: "  txn-1  ".to_string(),
            source_account: "acc-a".to_string(),
            destination_account: "acc-b".to_string(),
            amount,
            currency: " inr ".to_string(),
        }
    }

    #[test]
    fn amount_representations_hash_identically() {
        let a = canonical_hash(&payload(dec!(1500)));
        let b = canonical_hash(&payload(dec!(1500.0)));
        let c = canonical_hash(&payload(dec!(1500.00)));
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn differing_amount_hashes_differ() {
        let a = canonical_hash(&payload(dec!(1500.00)));
        let b = canonical_hash(&payload(dec!(1500.01)));
        assert_ne!(a, b);
    }

    #[test]
    fn whitespace_and_case_are_normalized() {
        let trimmed = canonical_hash(&payload(dec!(10)));
        let padded = canonical_hash(&TransactionWebhookIn {
            transaction_id: "txn-1".to_string(),
            source_account: "acc-a".to_string(),
            destination_account: "acc-b".to_string(),
            amount: dec!(10),
            currency: "INR".to_string(),
        });
        assert_eq!(trimmed, padded);
    }
}
