//! Worker pool: launches a fixed set of workers over the shared queues and
//! tracks their collective completion.

use crate::batch::{Job, JobResult};
use crate::pipeline::queue::JobQueue;
use crate::pipeline::worker::Worker;
use crate::processor::JobProcessor;
use crate::runtime::telemetry::Telemetry;
use futures::FutureExt;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub(crate) struct WorkerPool<P: JobProcessor> {
    count: usize,
    processor: Arc<P>,
    intake: Arc<JobQueue<Job>>,
    output: mpsc::Sender<JobResult>,
    telemetry: Arc<Telemetry>,
}

impl<P: JobProcessor> WorkerPool<P> {
    pub(crate) fn new(
        count: usize,
        processor: Arc<P>,
        intake: Arc<JobQueue<Job>>,
        output: mpsc::Sender<JobResult>,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            count,
            processor,
            intake,
            output,
            telemetry,
        }
    }

    /// Spawns exactly `count` workers against the shared queues.
    ///
    /// Every worker signals its exit through a shared countdown, so
    /// [`PoolHandle::wait`] observes the true last exit even when workers
    /// leave early under cancellation or panic.
    pub(crate) fn launch(self, shutdown: CancellationToken) -> PoolHandle {
        let WorkerPool {
            count,
            processor,
            intake,
            output,
            telemetry,
        } = self;

        let (done_tx, done_rx) = watch::channel(false);
        let remaining = Arc::new(AtomicUsize::new(count));
        let mut handles = Vec::with_capacity(count);

        for worker_id in 0..count {
            let worker = Worker::new(
                worker_id,
                processor.clone(),
                intake.clone(),
                output.clone(),
                shutdown.clone(),
                telemetry.clone(),
            );

            let done_tx = done_tx.clone();
            let remaining = remaining.clone();
            let shutdown = shutdown.clone();

            let handle = tokio::spawn(async move {
                let outcome = std::panic::AssertUnwindSafe(worker.run())
                    .catch_unwind()
                    .await;

                if let Err(payload) = outcome {
                    tracing::error!(
                        worker = worker_id,
                        panic = %panic_message(payload.as_ref()),
                        "worker task panicked; cancelling run"
                    );
                    shutdown.cancel();
                }

                // Exit is counted even on panic so `wait` cannot hang.
                if remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                    let _ = done_tx.send(true);
                }
            });
            handles.push(handle);
        }

        if handles.is_empty() {
            let _ = done_tx.send(true);
        }

        PoolHandle { done_rx, handles }
    }
}

/// Completion handle returned by [`WorkerPool::launch`].
pub(crate) struct PoolHandle {
    done_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl PoolHandle {
    /// Blocks until every launched worker has signaled its exit.
    pub(crate) async fn wait(mut self) {
        // The last exiting worker flips the flag before dropping its sender,
        // so a closed channel is only observable with the flag already set.
        let _ = self.done_rx.wait_for(|done| *done).await;

        for handle in self.handles {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "worker wrapper task failed to join");
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::EmailValidator;
    use tokio::time::{sleep, timeout, Duration};

    fn pool_fixture<P: JobProcessor>(
        count: usize,
        intake_capacity: usize,
        output_capacity: usize,
        processor: P,
    ) -> (WorkerPool<P>, Arc<JobQueue<Job>>, mpsc::Receiver<JobResult>) {
        let intake = Arc::new(JobQueue::with_capacity(intake_capacity));
        let (output_tx, output_rx) = mpsc::channel(output_capacity);
        let telemetry = Arc::new(Telemetry::default());
        let pool = WorkerPool::new(count, Arc::new(processor), intake.clone(), output_tx, telemetry);
        (pool, intake, output_rx)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn wait_completes_once_intake_is_exhausted() {
        let (pool, intake, mut output_rx) = pool_fixture(3, 8, 8, EmailValidator);

        for id in 0..5u64 {
            intake
                .push(Job::new(id, "user", format!("user{id}@example.com")))
                .await
                .expect("queue is open");
        }
        intake.close().await;

        let handle = pool.launch(CancellationToken::new());
        timeout(Duration::from_secs(2), handle.wait())
            .await
            .expect("pool should drain and exit");

        let mut received = 0;
        while output_rx.recv().await.is_some() {
            received += 1;
        }
        assert_eq!(received, 5, "one result per accepted job");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn wait_does_not_return_while_a_worker_is_blocked_publishing() {
        // Capacity-1 output channel with no consumer: the worker fills the
        // buffer with the first result and blocks publishing the second.
        let (pool, intake, output_rx) = pool_fixture(1, 4, 1, EmailValidator);

        intake
            .push(Job::new(1, "a", "a@example.com"))
            .await
            .expect("queue is open");
        intake
            .push(Job::new(2, "b", "b@example.com"))
            .await
            .expect("queue is open");
        intake.close().await;

        let shutdown = CancellationToken::new();
        let handle = pool.launch(shutdown.clone());
        let wait_future = tokio::spawn(handle.wait());

        sleep(Duration::from_millis(50)).await;
        assert!(
            !wait_future.is_finished(),
            "pool must not report completion while a worker is blocked"
        );

        shutdown.cancel();
        timeout(Duration::from_secs(2), wait_future)
            .await
            .expect("cancellation should unblock the publish")
            .expect("wait task should not panic");
        drop(output_rx);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn panicking_worker_still_signals_and_cancels_the_run() {
        let panicking = |_: &Job| -> JobResult { panic!("processor blew up") };
        let (pool, intake, _output_rx) = pool_fixture(2, 8, 8, panicking);

        intake
            .push(Job::new(1, "a", "a@example.com"))
            .await
            .expect("queue is open");
        intake.close().await;

        let shutdown = CancellationToken::new();
        let handle = pool.launch(shutdown.clone());

        timeout(Duration::from_secs(2), handle.wait())
            .await
            .expect("a panicking worker must still be counted");
        assert!(
            shutdown.is_cancelled(),
            "a worker panic should cancel the run token"
        );
    }

    #[tokio::test]
    async fn empty_pool_reports_done_immediately() {
        let (pool, _intake, _output_rx) = pool_fixture(0, 1, 1, EmailValidator);
        let handle = pool.launch(CancellationToken::new());
        timeout(Duration::from_millis(250), handle.wait())
            .await
            .expect("empty pool should be done immediately");
    }
}
