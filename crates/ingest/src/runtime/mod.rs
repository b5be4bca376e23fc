use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::IngestError;
use crate::traits::{CommitSink, Executor, RuntimeMetrics};
use crate::types::{Message, RuntimeConfig};

pub mod flow_control;
pub mod kernel;

pub use flow_control::{FlowControlConfig, FlowController};
pub use kernel::{BusChannels, KernelOutcome, KernelRunStats, PipelineBus, TokioPipelineBus};

pub type DynExecutor<P, Op> = Arc<dyn Executor<P, Op> + Send + Sync>;
pub type DynRuntimeMetrics = Arc<dyn RuntimeMetrics + Send + Sync>;

#[derive(Clone)]
pub struct IntakeHandle<P> {
    tx: mpsc::Sender<Message<P>>,
}

impl<P> IntakeHandle<P>
where
    P: Send + 'static,
{
    /// Waits while the intake queue is full.
    pub async fn submit(&self, message: Message<P>) -> Result<(), IngestError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| IngestError::Execution("ingest intake handle closed".to_string()))
    }
}

/// A one-shot dispatch run.
///
/// Take an [`IntakeHandle`] first, then [`run`](Self::run). The run ends when
/// every handle has been dropped and the queue is drained, so a producer
/// that never drops its handle keeps the run alive.
pub struct IngestRuntime<P, Op, C>
where
    P: Send + 'static,
    Op: Send + 'static,
    C: CommitSink<Op>,
{
    executor: DynExecutor<P, Op>,
    sink: C,
    metrics: DynRuntimeMetrics,
    pub flow_control: FlowControlConfig,
    channels: BusChannels<P>,
}

impl<P, Op, C> IngestRuntime<P, Op, C>
where
    P: Send + 'static,
    Op: Send + 'static,
    C: CommitSink<Op>,
{
    pub fn new(
        config: RuntimeConfig,
        executor: DynExecutor<P, Op>,
        sink: C,
        metrics: DynRuntimeMetrics,
    ) -> Self {
        Self::with_bus(config, executor, sink, metrics, &TokioPipelineBus)
    }

    pub fn with_bus(
        config: RuntimeConfig,
        executor: DynExecutor<P, Op>,
        sink: C,
        metrics: DynRuntimeMetrics,
        bus: &dyn PipelineBus<P>,
    ) -> Self {
        let flow_control = FlowControlConfig::from(&config);
        let channels = bus.open_channels(flow_control.channel_capacity);
        Self {
            executor,
            sink,
            metrics,
            flow_control,
            channels,
        }
    }

    pub fn intake_handle(&self) -> IntakeHandle<P> {
        IntakeHandle {
            tx: self.channels.intake_tx.clone(),
        }
    }

    pub async fn run(self, cancel: CancellationToken) -> Result<KernelOutcome<C>, IngestError> {
        let flow = FlowController::new(&self.flow_control);
        kernel::run_pipeline(
            self.channels,
            self.executor,
            self.sink,
            self.metrics,
            &flow,
            cancel,
        )
        .await
    }
}
