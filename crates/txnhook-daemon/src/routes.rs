//! Axum router and all HTTP handlers for txnhook-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::{sync::Arc, time::Instant};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, warn};
use txnhook_core::{CoreError, IngestService};
use txnhook_runtime::schedule_transaction_processing;
use txnhook_schemas::{TransactionWebhookAck, TransactionWebhookIn};

use crate::{
    api_types::{ErrorBody, HealthProbeResponse, TransactionRecord},
    state::AppState,
};

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_probe))
        .route("/v1/webhooks/transactions", post(ingest_webhook))
        .route("/v1/transactions/:transaction_id", get(get_transaction))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /  (health probe)
// ---------------------------------------------------------------------------

pub(crate) async fn health_probe(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let current_time = st
        .clock
        .now()
        .with_timezone(&st.display_timezone)
        .to_rfc3339();
    (
        StatusCode::OK,
        Json(HealthProbeResponse {
            status: "HEALTHY",
            current_time,
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/webhooks/transactions
// ---------------------------------------------------------------------------

/// Ingest a single webhook delivery.
///
/// The handler itself never blocks on processing: `ingest` commits (or
/// classifies the duplicate) and returns, and if the arbiter says to
/// schedule, a background task is registered with the runtime and the
/// handler returns immediately after. Response latency is therefore
/// independent of `processing_delay_seconds`.
pub(crate) async fn ingest_webhook(
    State(st): State<Arc<AppState>>,
    Json(payload): Json<TransactionWebhookIn>,
) -> Response {
    let started = Instant::now();

    let ingest_service = IngestService::with_deadline(
        &st.repository,
        st.clock.as_ref(),
        st.settings.processing_stale_timeout,
        st.settings.db_operation_timeout,
    );
    let outcome = match ingest_service.ingest(payload).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if matches!(e, CoreError::StoreUnavailable(_)) {
                warn!("ingest failed with a transient store error");
            }
            return map_core_error(e);
        }
    };

    if outcome.should_schedule {
        schedule_transaction_processing(
            st.repository.clone(),
            st.clock.clone(),
            st.shutdown.clone(),
            st.registry.clone(),
            outcome.transaction_id.clone(),
            st.settings.processing_delay,
        )
        .await;
    }

    let response_time_ms = started.elapsed().as_secs_f64() * 1000.0;
    (
        StatusCode::ACCEPTED,
        Json(TransactionWebhookAck {
            status_code: 202,
            acknowledged: true,
            transaction_id: outcome.transaction_id,
            response_time_ms,
        }),
    )
        .into_response()
}

fn map_core_error(err: CoreError) -> Response {
    match err {
        CoreError::ValidationError(msg) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorBody { error: msg })).into_response()
        }
        CoreError::StoreUnavailable(msg) => {
            (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorBody { error: msg })).into_response()
        }
        CoreError::InternalInconsistency(msg) => {
            error!(error = %msg, "internal inconsistency during ingest");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody {
                    error: "transient store inconsistency, retry".to_string(),
                }),
            )
                .into_response()
        }
        CoreError::ProcessingError(_) | CoreError::InterruptedByShutdown => {
            // Neither variant is ever returned from the ingest path; only the
            // Background Processor produces them, and it never surfaces to a
            // request handler.
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "unexpected error".to_string(),
                }),
            )
                .into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// GET /v1/transactions/{transaction_id}
// ---------------------------------------------------------------------------

/// Returns `[]` for an unknown `transaction_id`, or a one-element array for
/// a known one. Always 200 for a well-formed path param; the empty array is
/// the not-found signal (see DESIGN.md for why the list form was kept over
/// a conventional 404).
pub(crate) async fn get_transaction(
    State(st): State<Arc<AppState>>,
    Path(transaction_id): Path<String>,
) -> Response {
    let found = match st.repository.get_by_transaction_id(&transaction_id).await {
        Ok(found) => found,
        Err(e) => return map_core_error(e),
    };

    match found {
        Some(transaction) => Json(vec![TransactionRecord::localize(&transaction, st.display_timezone)]).into_response(),
        None => Json(Vec::<TransactionRecord>::new()).into_response(),
    }
}
