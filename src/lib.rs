pub mod batch;
pub mod pipeline;
pub mod processor;
pub mod runtime;

pub use batch::{demo_batch, Job, JobResult, RunSummary};
pub use pipeline::collector::{ReportSink, TracingSink};
pub use pipeline::dispatcher::{Dispatcher, RunReport, RunState};
pub use pipeline::queue::JobQueue;
pub use processor::{EmailValidator, JobProcessor};
pub use runtime::config::{PipelineConfig, PipelineConfigBuilder};
pub use runtime::runner::Runner;
pub use runtime::telemetry::{init_tracing, Telemetry, TelemetrySnapshot};
