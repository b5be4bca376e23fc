use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::IngestError;
use crate::types::{ExecutionResult, Message};

/// Runs one message to completion.
///
/// A failure of the work itself is reported through
/// [`ExecutionResult::failed`]; an `Err` aborts the whole run.
/// Implementations must return promptly once `cancel` fires.
#[async_trait]
pub trait Executor<P, Op>: Send + Sync {
    async fn execute(
        &self,
        message: Message<P>,
        cancel: CancellationToken,
    ) -> Result<ExecutionResult<Op>, IngestError>;
}

/// Receives every execution result on a single collector task, so
/// implementations own their state without locking.
pub trait CommitSink<Op>: Send + 'static {
    fn commit(&mut self, result: ExecutionResult<Op>) -> Result<(), IngestError>;
}

pub trait RuntimeMetrics: Send + Sync {
    fn observe_queue_depth(&self, queue: &'static str, depth: usize);
    fn observe_throughput(&self, stage: &'static str, count: usize);
}
