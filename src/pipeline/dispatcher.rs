//! Run orchestration: queue allocation, feeding, and the shutdown protocol.

use crate::batch::{Job, RunSummary};
use crate::pipeline::collector::{Collector, ReportSink, TracingSink};
use crate::pipeline::pool::WorkerPool;
use crate::pipeline::queue::JobQueue;
use crate::processor::JobProcessor;
use crate::runtime::config::PipelineConfig;
use crate::runtime::telemetry::Telemetry;
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Progress of one dispatcher run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Dispatching,
    Draining,
    Completed,
    Cancelled,
}

/// Final outcome of a run: the terminal state plus the collector's summary.
///
/// A `Cancelled` run still carries a best-effort summary covering every
/// result that was published before the cancellation took hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub state: RunState,
    pub summary: RunSummary,
}

/// Drives one batch through the worker pool and collector.
///
/// The shutdown protocol is strictly ordered: feed everything, close intake,
/// wait for every worker to exit, let the output channel close, then await
/// the collector's summary. Every path, cancelled or not, runs the whole
/// sequence, so no task is ever left behind.
pub struct Dispatcher<P: JobProcessor> {
    config: PipelineConfig,
    processor: Arc<P>,
    telemetry: Arc<Telemetry>,
    shutdown: CancellationToken,
    state: RunState,
}

impl<P: JobProcessor> Dispatcher<P> {
    pub fn new(config: PipelineConfig, processor: P) -> Self {
        Self::with_cancellation_token(config, processor, CancellationToken::new())
    }

    /// Wires the dispatcher to an externally owned cancellation token so
    /// callers can integrate deadlines or signal handlers.
    pub fn with_cancellation_token(
        config: PipelineConfig,
        processor: P,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            processor: Arc::new(processor),
            telemetry: Arc::new(Telemetry::default()),
            shutdown,
            state: RunState::Idle,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Swaps in a fresh cancellation token, typically after a cancelled run.
    pub fn replace_cancellation_token(&mut self, shutdown: CancellationToken) {
        self.shutdown = shutdown;
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn telemetry(&self) -> Arc<Telemetry> {
        self.telemetry.clone()
    }

    /// Runs one batch to completion, reporting through the default
    /// [`TracingSink`].
    pub async fn run(&mut self, batch: Vec<Job>) -> Result<RunReport> {
        self.run_with_sink(batch, TracingSink).await
    }

    /// Runs one batch to completion, reporting through `sink`.
    pub async fn run_with_sink<S: ReportSink>(
        &mut self,
        batch: Vec<Job>,
        sink: S,
    ) -> Result<RunReport> {
        ensure_distinct_ids(&batch)?;

        let worker_count = self.config.worker_count();
        let capacity = self
            .config
            .queue_capacity()
            .unwrap_or(batch.len())
            .max(1);

        self.transition(RunState::Dispatching);
        tracing::info!(
            jobs = batch.len(),
            workers = worker_count,
            capacity,
            "starting batch run"
        );

        let intake = Arc::new(JobQueue::with_capacity(capacity));
        let (output_tx, output_rx) = mpsc::channel(capacity);

        let pool = WorkerPool::new(
            worker_count,
            self.processor.clone(),
            intake.clone(),
            output_tx,
            self.telemetry.clone(),
        );
        let pool_handle = pool.launch(self.shutdown.clone());
        let collector = Collector::new(output_rx, sink).spawn();

        for job in batch {
            if self.shutdown.is_cancelled() {
                tracing::info!("cancelled while dispatching; stopping feed");
                break;
            }
            tokio::select! {
                pushed = intake.push(job) => {
                    if let Err(job) = pushed {
                        bail!("intake queue closed while dispatching job {}", job.id);
                    }
                }
                _ = self.shutdown.cancelled() => {
                    tracing::info!("cancelled while enqueueing; stopping feed");
                    break;
                }
            }
        }
        // Closed even on the cancelled path so draining workers see the end
        // of input instead of waiting on an open queue.
        intake.close().await;

        self.transition(RunState::Draining);
        pool_handle.wait().await;

        // Every worker has exited, so every output sender is gone and the
        // collector observes closed-and-drained.
        let summary = collector.await.context("collector task failed")?;

        let state = if self.shutdown.is_cancelled() {
            self.telemetry.record_cancelled_run();
            RunState::Cancelled
        } else {
            self.telemetry.record_completed_run();
            RunState::Completed
        };
        self.transition(state);

        let snapshot = self.telemetry.snapshot();
        tracing::info!(
            valid = summary.valid,
            invalid = summary.invalid,
            processed = snapshot.processed_jobs,
            abandoned = snapshot.abandoned_results,
            state = ?state,
            "batch run finished"
        );

        Ok(RunReport { state, summary })
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = ?self.state, to = ?next, "run state transition");
        self.state = next;
    }
}

fn ensure_distinct_ids(batch: &[Job]) -> Result<()> {
    let mut seen = HashSet::with_capacity(batch.len());
    for job in batch {
        if !seen.insert(job.id) {
            bail!("duplicate job id {} in batch", job.id);
        }
    }
    Ok(())
}
