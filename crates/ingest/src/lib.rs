pub mod error;
pub mod runtime;
pub mod traits;
pub mod types;

pub use error::IngestError;
pub use runtime::{
    DynExecutor, DynRuntimeMetrics, FlowControlConfig, IngestRuntime,
    IntakeHandle, KernelOutcome, KernelRunStats, PipelineBus, TokioPipelineBus,
};
pub use traits::{CommitSink, Executor, RuntimeMetrics};
pub use types::{
    ExecutionResult, ExecutionStatus, Message, MessageId, RuntimeConfig, default_parallelism,
};
pub use tokio_util::sync::CancellationToken;
