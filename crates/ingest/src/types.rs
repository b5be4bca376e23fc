use std::num::NonZeroUsize;

pub type MessageId = String;

/// One unit of work travelling through the intake queue.
#[derive(Debug, Clone)]
pub struct Message<P> {
    pub msg_id: MessageId,
    pub payload: P,
}

impl<P> Message<P> {
    pub fn new(msg_id: impl Into<String>, payload: P) -> Self {
        Self {
            msg_id: msg_id.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ExecutionResult<Op> {
    pub msg_id: MessageId,
    pub status: ExecutionStatus,
    pub output: Op,
    pub error: Option<String>,
}

impl<Op> ExecutionResult<Op> {
    pub fn done(msg_id: impl Into<String>, output: Op) -> Self {
        Self {
            msg_id: msg_id.into(),
            status: ExecutionStatus::Done,
            output,
            error: None,
        }
    }

    pub fn failed(msg_id: impl Into<String>, output: Op, error: impl Into<String>) -> Self {
        Self {
            msg_id: msg_id.into(),
            status: ExecutionStatus::Failed,
            output,
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == ExecutionStatus::Failed
    }
}

/// Number of processing units available to this process, never zero.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub kernel_channel_capacity: usize,
    pub max_in_flight: usize,
}

impl RuntimeConfig {
    /// Bounds both the intake queue and the in-flight limit by `jobs`.
    /// Zero means "one per available processing unit".
    pub fn with_parallelism(jobs: usize) -> Self {
        let jobs = if jobs == 0 { default_parallelism() } else { jobs };
        Self {
            kernel_channel_capacity: jobs,
            max_in_flight: jobs,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::with_parallelism(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_jobs_falls_back_to_available_parallelism() {
        let config = RuntimeConfig::with_parallelism(0);
        assert_eq!(config.max_in_flight, default_parallelism());
        assert!(config.max_in_flight >= 1);
    }

    #[test]
    fn explicit_jobs_bound_queue_and_in_flight() {
        let config = RuntimeConfig::with_parallelism(3);
        assert_eq!(config.max_in_flight, 3);
        assert_eq!(config.kernel_channel_capacity, 3);
    }
}
