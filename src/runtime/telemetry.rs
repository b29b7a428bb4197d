use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls
/// back to `info`. Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Lightweight rolling counters describing pipeline activity.
///
/// Counters are relaxed atomics; workers bump them from any task without
/// coordination.
#[derive(Default, Debug)]
pub struct Telemetry {
    processed_jobs: AtomicU64,
    abandoned_results: AtomicU64,
    completed_runs: AtomicU64,
    cancelled_runs: AtomicU64,
}

impl Telemetry {
    pub fn record_processed_job(&self) {
        self.processed_jobs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned_result(&self) {
        self.abandoned_results.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed_run(&self) {
        self.completed_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled_run(&self) {
        self.cancelled_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn processed_jobs(&self) -> u64 {
        self.processed_jobs.load(Ordering::Relaxed)
    }

    pub fn abandoned_results(&self) -> u64 {
        self.abandoned_results.load(Ordering::Relaxed)
    }

    pub fn completed_runs(&self) -> u64 {
        self.completed_runs.load(Ordering::Relaxed)
    }

    pub fn cancelled_runs(&self) -> u64 {
        self.cancelled_runs.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            processed_jobs: self.processed_jobs.load(Ordering::Relaxed),
            abandoned_results: self.abandoned_results.load(Ordering::Relaxed),
            completed_runs: self.completed_runs.load(Ordering::Relaxed),
            cancelled_runs: self.cancelled_runs.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TelemetrySnapshot {
    pub processed_jobs: u64,
    pub abandoned_results: u64,
    pub completed_runs: u64,
    pub cancelled_runs: u64,
}
