use anyhow::{bail, Result};
use std::time::Duration;

pub const DEFAULT_WORKER_COUNT: usize = 3;
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

/// Runtime configuration for the validation pipeline.
///
/// All instances must be constructed via [`PipelineConfig::builder`] so
/// invariants are validated before any consumer observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    worker_count: usize,
    deadline: Option<Duration>,
    queue_capacity: Option<usize>,
}

impl PipelineConfig {
    /// Returns a builder to incrementally construct and validate a
    /// configuration.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Number of concurrent workers launched per run.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Wall-clock budget for one run; `None` disables the deadline.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Queue capacity override; defaults to the batch size when unset so the
    /// bulk enqueue never blocks.
    pub fn queue_capacity(&self) -> Option<usize> {
        self.queue_capacity
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            bail!("worker_count must be greater than 0");
        }

        if let Some(deadline) = self.deadline {
            if deadline.is_zero() {
                bail!("deadline must be greater than 0");
            }
        }

        if let Some(capacity) = self.queue_capacity {
            if capacity == 0 {
                bail!("queue_capacity must be greater than 0");
            }
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            deadline: Some(DEFAULT_DEADLINE),
            queue_capacity: None,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct PipelineConfigBuilder {
    worker_count: Option<usize>,
    deadline: Option<Duration>,
    no_deadline: bool,
    queue_capacity: Option<usize>,
}

impl PipelineConfigBuilder {
    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = Some(count);
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Disables the run deadline entirely; the run only stops on exhaustion
    /// or an external cancellation.
    pub fn no_deadline(mut self) -> Self {
        self.no_deadline = true;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> Result<PipelineConfig> {
        let deadline = if self.no_deadline {
            None
        } else {
            Some(self.deadline.unwrap_or(DEFAULT_DEADLINE))
        };

        let config = PipelineConfig {
            worker_count: self.worker_count.unwrap_or(DEFAULT_WORKER_COUNT),
            deadline,
            queue_capacity: self.queue_capacity,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_valid_defaults() {
        let config = PipelineConfig::builder().build().unwrap();
        assert_eq!(config.worker_count(), DEFAULT_WORKER_COUNT);
        assert_eq!(config.deadline(), Some(DEFAULT_DEADLINE));
        assert_eq!(config.queue_capacity(), None);
    }

    #[test]
    fn overrides_are_applied() {
        let config = PipelineConfig::builder()
            .worker_count(8)
            .deadline(Duration::from_secs(30))
            .queue_capacity(64)
            .build()
            .expect("config should build");
        assert_eq!(config.worker_count(), 8);
        assert_eq!(config.deadline(), Some(Duration::from_secs(30)));
        assert_eq!(config.queue_capacity(), Some(64));
    }

    #[test]
    fn no_deadline_disables_the_default() {
        let config = PipelineConfig::builder().no_deadline().build().unwrap();
        assert_eq!(config.deadline(), None);
    }

    #[test]
    fn validation_catches_invalid_values() {
        let err = PipelineConfig::builder()
            .worker_count(0)
            .build()
            .unwrap_err();
        assert!(
            format!("{err}").contains("worker_count"),
            "error should mention worker_count"
        );

        let err = PipelineConfig::builder()
            .deadline(Duration::from_secs(0))
            .build()
            .unwrap_err();
        assert!(
            format!("{err}").contains("deadline"),
            "error should mention deadline"
        );

        let err = PipelineConfig::builder()
            .queue_capacity(0)
            .build()
            .unwrap_err();
        assert!(
            format!("{err}").contains("queue_capacity"),
            "error should mention queue_capacity"
        );
    }
}
