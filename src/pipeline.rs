//! Fan-out/fan-in concurrency core split across focused submodules:
//! - `queue`: bounded MPMC intake queue with close/drain semantics
//! - `worker`: per-task pull/process/publish loop
//! - `pool`: fixed-size worker set with a counting completion barrier
//! - `collector`: single-task result aggregation behind a sink
//! - `dispatcher`: run state machine and shutdown ordering

pub mod collector;
pub mod dispatcher;
pub mod queue;

pub(crate) mod pool;
pub(crate) mod worker;
