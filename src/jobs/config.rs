//! Scheduling configuration for the job system

use super::JobError;

/// Upper bound on checker runs per declaration before it is given up on.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

/// What happens to a checker job whose declaration depends on an entity that has not settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Suspension {
    /// Register as a waiter on the dependency; re-enqueued when it is emitted or fails.
    #[default]
    Park,
    /// Append the job to the tail of the queue and retry later.
    Requeue,
}

/// Job system configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    /// Worker threads; `1` runs everything on the caller's thread.
    pub workers: usize,
    pub suspension: Suspension,
    /// Checker runs allowed per declaration.
    pub max_attempts: u32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            suspension: Suspension::Park,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl JobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the suspension strategy
    pub fn with_suspension(mut self, suspension: Suspension) -> Self {
        self.suspension = suspension;
        self
    }

    /// Set the per-declaration attempt cap
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn validate(&self) -> Result<(), JobError> {
        if self.workers == 0 {
            return Err(JobError::NoWorkers);
        }
        if self.max_attempts == 0 {
            return Err(JobError::NoAttempts);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = JobConfig::default();
        assert_eq!(config.workers, 1);
        assert_eq!(config.suspension, Suspension::Park);
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_builders() {
        let config = JobConfig::new()
            .with_workers(4)
            .with_suspension(Suspension::Requeue)
            .with_max_attempts(3);
        assert_eq!(config.workers, 4);
        assert_eq!(config.suspension, Suspension::Requeue);
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        assert_eq!(JobConfig::new().with_workers(0).validate(), Err(JobError::NoWorkers));
        assert_eq!(JobConfig::new().with_max_attempts(0).validate(), Err(JobError::NoAttempts));
    }
}
