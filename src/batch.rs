//! Batch entities: jobs going in, results and summaries coming out.

/// A unit of work submitted for processing.
///
/// Jobs are immutable once constructed. Ids must be unique within a batch;
/// the dispatcher rejects batches that violate this before starting any work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: u64,
    pub user_name: String,
    pub email: String,
}

impl Job {
    pub fn new(id: u64, user_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            user_name: user_name.into(),
            email: email.into(),
        }
    }
}

/// Outcome of processing one job.
///
/// Exactly one result is produced per accepted job under non-cancelled
/// completion. The email is echoed back for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub job_id: u64,
    pub valid: bool,
    pub email: String,
    pub message: String,
}

/// Aggregate counts for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub valid: u64,
    pub invalid: u64,
}

impl RunSummary {
    pub fn record(&mut self, result: &JobResult) {
        if result.valid {
            self.valid += 1;
        } else {
            self.invalid += 1;
        }
    }

    /// Number of results actually produced, cancelled or not.
    pub fn total(&self) -> u64 {
        self.valid + self.invalid
    }
}

/// Sample batch of user records, handy for demos and smoke tests.
pub fn demo_batch() -> Vec<Job> {
    vec![
        Job::new(1, "john", "john@example.com"),
        Job::new(2, "ab", "invalid-email"),
        Job::new(3, "jane", "1-1@example.com"),
        Job::new(4, "doe", "doeexample.com"),
        Job::new(5, "jane", "jane.example.com"),
        Job::new(6, "x", "x@gmail.com"),
        Job::new(7, "2e", "2example.com"),
        Job::new(8, "ca", "invalid"),
        Job::new(9, "dave", "dave£example.com"),
        Job::new(10, "sameeralikhan", "salikhan8458@gmail"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_partitions_results() {
        let mut summary = RunSummary::default();
        summary.record(&JobResult {
            job_id: 1,
            valid: true,
            email: "a@b.com".into(),
            message: "ok".into(),
        });
        summary.record(&JobResult {
            job_id: 2,
            valid: false,
            email: "bad".into(),
            message: "nope".into(),
        });

        assert_eq!(summary.valid, 1);
        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.total(), 2);
    }

    #[test]
    fn demo_batch_has_distinct_ids() {
        let batch = demo_batch();
        let mut ids: Vec<u64> = batch.iter().map(|job| job.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), batch.len(), "demo batch ids must be unique");
    }
}
