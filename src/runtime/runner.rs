use crate::batch::Job;
use crate::pipeline::collector::ReportSink;
use crate::pipeline::dispatcher::{Dispatcher, RunReport};
use crate::processor::JobProcessor;
use crate::runtime::config::PipelineConfig;
use anyhow::Result;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Coordinates dispatcher runs and owns the root [`CancellationToken`],
/// arming the configured deadline and optionally handling Ctrl-C.
pub struct Runner<P: JobProcessor> {
    dispatcher: Dispatcher<P>,
    shutdown: CancellationToken,
    deadline: Option<Duration>,
}

impl<P: JobProcessor> Runner<P> {
    /// Creates a new runner and wires a root token that propagates through
    /// the entire pipeline (dispatcher, workers, enqueue loop).
    pub fn new(config: PipelineConfig, processor: P) -> Self {
        let shutdown = CancellationToken::new();
        let deadline = config.deadline();
        let dispatcher = Dispatcher::with_cancellation_token(config, processor, shutdown.clone());
        Self {
            dispatcher,
            shutdown,
            deadline,
        }
    }

    /// Returns a clone of the root shutdown token so external callers can
    /// integrate with their own signal handlers or cancellation strategies.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the batch to completion, cancelling at the configured deadline.
    pub async fn run(&mut self, batch: Vec<Job>) -> Result<RunReport> {
        let deadline_task = self.arm_deadline();
        let outcome = self.dispatcher.run(batch).await;
        self.disarm(deadline_task);
        outcome
    }

    /// Like [`Runner::run`] but reporting through a caller-provided sink.
    pub async fn run_with_sink<S: ReportSink>(
        &mut self,
        batch: Vec<Job>,
        sink: S,
    ) -> Result<RunReport> {
        let deadline_task = self.arm_deadline();
        let outcome = self.dispatcher.run_with_sink(batch, sink).await;
        self.disarm(deadline_task);
        outcome
    }

    /// Runs the batch, additionally treating Ctrl-C (SIGINT) as a
    /// cancellation trigger.
    pub async fn run_until_ctrl_c(&mut self, batch: Vec<Job>) -> Result<RunReport> {
        let trigger = self.shutdown.clone();
        let signal_task = tokio::spawn(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    tracing::info!("Ctrl-C received; cancelling run");
                    trigger.cancel();
                }
                _ = trigger.cancelled() => {}
            }
        });

        let outcome = self.run(batch).await;
        signal_task.abort();
        outcome
    }

    fn arm_deadline(&self) -> Option<JoinHandle<()>> {
        let deadline = self.deadline?;
        let shutdown = self.shutdown.clone();
        Some(tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(deadline) => {
                    tracing::info!(?deadline, "deadline expired; cancelling run");
                    shutdown.cancel();
                }
                _ = shutdown.cancelled() => {}
            }
        }))
    }

    fn disarm(&mut self, deadline_task: Option<JoinHandle<()>>) {
        if let Some(task) = deadline_task {
            task.abort();
        }

        // A consumed token cannot be un-cancelled; swap in a fresh one so the
        // runner can be reused after a cancelled run.
        if self.shutdown.is_cancelled() {
            self.shutdown = CancellationToken::new();
            self.dispatcher
                .replace_cancellation_token(self.shutdown.clone());
        }
    }
}
