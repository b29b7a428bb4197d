//! The processing seam: a pure per-job function behind a trait so the
//! pipeline never depends on what "processing" means.

use crate::batch::{Job, JobResult};

/// Maps one job to one result.
///
/// Implementations must be pure: no shared mutable state, no side effects,
/// safe to call concurrently from every worker without synchronization.
/// Validation failure is data (`valid: false`), never an error.
pub trait JobProcessor: Send + Sync + 'static {
    fn process(&self, job: &Job) -> JobResult;
}

impl<F> JobProcessor for F
where
    F: Fn(&Job) -> JobResult + Send + Sync + 'static,
{
    fn process(&self, job: &Job) -> JobResult {
        self(job)
    }
}

/// Checks whether a job's email address looks plausible.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmailValidator;

impl JobProcessor for EmailValidator {
    fn process(&self, job: &Job) -> JobResult {
        let mut issues = Vec::new();
        if !job.email.contains('@') {
            issues.push("Invalid Email");
        }

        if issues.is_empty() {
            JobResult {
                job_id: job.id,
                valid: true,
                email: job.email.clone(),
                message: "Valid Email".to_owned(),
            }
        } else {
            JobResult {
                job_id: job.id,
                valid: false,
                email: job.email.clone(),
                message: issues.join(","),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plausible_email() {
        let result = EmailValidator.process(&Job::new(1, "john", "john@example.com"));
        assert!(result.valid);
        assert_eq!(result.message, "Valid Email");
        assert_eq!(result.job_id, 1);
    }

    #[test]
    fn rejects_email_without_at_sign() {
        let result = EmailValidator.process(&Job::new(2, "ab", "invalid-email"));
        assert!(!result.valid);
        assert_eq!(result.message, "Invalid Email");
        assert_eq!(result.email, "invalid-email");
    }

    #[test]
    fn processing_is_idempotent() {
        let job = Job::new(3, "jane", "1-1@example.com");
        assert_eq!(EmailValidator.process(&job), EmailValidator.process(&job));
    }

    #[test]
    fn closures_implement_the_trait() {
        let always_valid = |job: &Job| JobResult {
            job_id: job.id,
            valid: true,
            email: job.email.clone(),
            message: "ok".to_owned(),
        };
        let result = always_valid.process(&Job::new(4, "doe", "doeexample.com"));
        assert!(result.valid);
        assert_eq!(result.job_id, 4);
    }
}
