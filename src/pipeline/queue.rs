use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Bounded FIFO shared by every worker, with an explicit closed state.
///
/// Closing marks the end of input without discarding anything: `pop` keeps
/// handing out buffered items after `close` and only returns `None` once the
/// queue is both closed and drained. That makes "closed and empty"
/// observably distinct from "empty but still open".
pub struct JobQueue<T> {
    state: Mutex<QueueState<T>>,
    notify: Notify,
    capacity: usize,
}

impl<T> JobQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than zero");
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            notify: Notify::new(),
            capacity,
        }
    }

    /// Enqueues one item, waiting while the queue is at capacity.
    ///
    /// Returns the item back to the caller if the queue was closed before it
    /// could be accepted.
    pub async fn push(&self, item: T) -> Result<(), T> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().await;
                if state.closed {
                    return Err(item);
                }
                if state.items.len() < self.capacity {
                    state.items.push_back(item);
                    drop(state);
                    self.notify.notify_waiters();
                    return Ok(());
                }
            }
            notified.await;
        }
    }

    /// Dequeues the next item, waiting until one is available.
    ///
    /// Returns `None` only once the queue is closed *and* drained.
    pub async fn pop(&self) -> Option<T> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().await;
                if let Some(item) = state.items.pop_front() {
                    drop(state);
                    self.notify.notify_waiters();
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Non-blocking variant of [`JobQueue::pop`]; `Ok(None)` means the queue
    /// is currently empty but still open.
    pub async fn try_pop(&self) -> Result<Option<T>, Closed> {
        let mut state = self.state.lock().await;
        match state.items.pop_front() {
            Some(item) => {
                drop(state);
                self.notify.notify_waiters();
                Ok(Some(item))
            }
            None if state.closed => Err(Closed),
            None => Ok(None),
        }
    }

    /// Marks the end of input and wakes every waiter.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        state.closed = true;
        drop(state);
        self.notify.notify_waiters();
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.items.is_empty()
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }
}

/// Marker returned by [`JobQueue::try_pop`] once the queue is closed and
/// drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed;
