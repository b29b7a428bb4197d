use crate::batch::{Job, JobResult};
use crate::pipeline::queue::JobQueue;
use crate::processor::JobProcessor;
use crate::runtime::telemetry::Telemetry;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// One member of the pool: pulls jobs from the shared intake queue, applies
/// the processor, and publishes results until the queue is exhausted or the
/// run is cancelled.
pub(crate) struct Worker<P: JobProcessor> {
    id: usize,
    processor: Arc<P>,
    intake: Arc<JobQueue<Job>>,
    output: mpsc::Sender<JobResult>,
    shutdown: CancellationToken,
    telemetry: Arc<Telemetry>,
}

impl<P: JobProcessor> Worker<P> {
    pub(crate) fn new(
        id: usize,
        processor: Arc<P>,
        intake: Arc<JobQueue<Job>>,
        output: mpsc::Sender<JobResult>,
        shutdown: CancellationToken,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            id,
            processor,
            intake,
            output,
            shutdown,
            telemetry,
        }
    }

    #[tracing::instrument(name = "worker", skip_all, fields(worker = self.id))]
    pub(crate) async fn run(self) {
        tracing::debug!("worker task started");

        loop {
            if self.shutdown.is_cancelled() {
                tracing::debug!("shutdown requested; exiting worker loop");
                break;
            }

            let job = tokio::select! {
                job = self.intake.pop() => match job {
                    Some(job) => job,
                    None => {
                        tracing::debug!("intake queue closed and drained; exiting");
                        break;
                    }
                },
                _ = self.shutdown.cancelled() => {
                    tracing::debug!("shutdown requested while waiting for a job");
                    break;
                }
            };

            // The processor is pure and synchronous; cancellation is only
            // honored at the next suspension point, never mid-computation.
            let result = self.processor.process(&job);
            self.telemetry.record_processed_job();

            tokio::select! {
                sent = self.output.send(result) => {
                    if sent.is_err() {
                        tracing::warn!(job = job.id, "result channel closed before publish");
                        break;
                    }
                }
                _ = self.shutdown.cancelled() => {
                    self.telemetry.record_abandoned_result();
                    tracing::debug!(job = job.id, "cancelled while publishing; abandoning result");
                    break;
                }
            }
        }

        tracing::debug!("worker task exited");
    }
}
