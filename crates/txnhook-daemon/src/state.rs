//! Shared runtime state for txnhook-daemon.
//!
//! All types here are `Clone`-able (via `Arc` or copy). Handlers receive
//! `State<Arc<AppState>>` from Axum; this module owns nothing async itself.

use std::sync::Arc;

use chrono_tz::Tz;
use txnhook_config::Settings;
use txnhook_core::{Clock, Repository, SystemClock};
use txnhook_runtime::{ShutdownSignal, TaskRegistry};

/// Static build metadata included in the health response.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub build: BuildInfo,
    pub repository: Repository,
    pub clock: Arc<dyn Clock>,
    pub shutdown: ShutdownSignal,
    pub registry: Arc<TaskRegistry>,
    pub settings: Arc<Settings>,
    pub display_timezone: Tz,
}

impl AppState {
    pub fn new(settings: Arc<Settings>, repository: Repository) -> Self {
        let display_timezone = settings
            .db_timezone
            .parse::<Tz>()
            .unwrap_or(chrono_tz::Asia::Kolkata);

        Self {
            build: BuildInfo {
                service: "txnhook-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            repository,
            clock: Arc::new(SystemClock),
            shutdown: ShutdownSignal::new(),
            registry: Arc::new(TaskRegistry::new()),
            settings,
            display_timezone,
        }
    }
}
