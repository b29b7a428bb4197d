//! Result collection: a single task that drains the output channel, keeps
//! the counts, and reports through an abstract sink.

use crate::batch::{JobResult, RunSummary};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Destination for per-result notifications and the final summary.
///
/// The pipeline only needs an abstract emit capability; swap the sink to
/// redirect output. Tests use a recording sink.
pub trait ReportSink: Send + 'static {
    fn emit(&mut self, result: &JobResult);
    fn finish(&mut self, summary: &RunSummary);
}

/// Default sink: one `tracing` line per result plus a summary line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn emit(&mut self, result: &JobResult) {
        if result.valid {
            tracing::info!(job = result.job_id, message = %result.message, "job valid");
        } else {
            tracing::info!(
                job = result.job_id,
                message = %result.message,
                email = %result.email,
                "job invalid"
            );
        }
    }

    fn finish(&mut self, summary: &RunSummary) {
        tracing::info!(
            valid = summary.valid,
            invalid = summary.invalid,
            "batch processing completed"
        );
    }
}

/// Drains the output channel until it is closed and empty.
///
/// The collector runs single-threaded; its counters are owned exclusively by
/// this task, so no synchronization is needed around them.
pub(crate) struct Collector<S: ReportSink> {
    output: mpsc::Receiver<JobResult>,
    sink: S,
}

impl<S: ReportSink> Collector<S> {
    pub(crate) fn new(output: mpsc::Receiver<JobResult>, sink: S) -> Self {
        Self { output, sink }
    }

    /// Spawns the collector task. The handle resolves to the final summary
    /// and doubles as the one-shot "done" signal the dispatcher waits on.
    pub(crate) fn spawn(self) -> JoinHandle<RunSummary> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) -> RunSummary {
        let mut summary = RunSummary::default();

        // recv() keeps yielding buffered results after the channel closes;
        // None means closed and drained.
        while let Some(result) = self.output.recv().await {
            summary.record(&result);
            self.sink.emit(&result);
        }

        self.sink.finish(&summary);
        summary
    }
}
