use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::runtime::flow_control::FlowController;
use crate::traits::{CommitSink, Executor, RuntimeMetrics};
use crate::types::{ExecutionResult, Message};

pub struct BusChannels<P> {
    pub intake_tx: mpsc::Sender<Message<P>>,
    pub intake_rx: mpsc::Receiver<Message<P>>,
}

pub trait PipelineBus<P>: Send + Sync
where
    P: Send + 'static,
{
    fn open_channels(&self, capacity: usize) -> BusChannels<P>;
}

#[derive(Default)]
pub struct TokioPipelineBus;

impl<P> PipelineBus<P> for TokioPipelineBus
where
    P: Send + 'static,
{
    fn open_channels(&self, capacity: usize) -> BusChannels<P> {
        let (intake_tx, intake_rx) = mpsc::channel::<Message<P>>(capacity.max(1));
        BusChannels {
            intake_tx,
            intake_rx,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KernelRunStats {
    pub dispatched: usize,
    pub committed: usize,
    pub failed: usize,
}

/// What a completed run hands back: counters plus the sink with
/// everything it accumulated.
pub struct KernelOutcome<C> {
    pub stats: KernelRunStats,
    pub sink: C,
}

/// Drains the intake, running at most `flow.max_in_flight()` executions at
/// once, and feeds every result to `sink` on a single collector task.
///
/// Returns once the intake is closed and empty and every dispatched message
/// has been committed. Cancellation stops intake immediately; executions
/// already running observe a child of `cancel` and the run reports
/// [`IngestError::Cancelled`].
pub async fn run_pipeline<P, Op, EX, C, RM>(
    channels: BusChannels<P>,
    executor: Arc<EX>,
    sink: C,
    metrics: Arc<RM>,
    flow: &FlowController,
    cancel: CancellationToken,
) -> Result<KernelOutcome<C>, IngestError>
where
    P: Send + 'static,
    Op: Send + 'static,
    EX: Executor<P, Op> + Send + Sync + 'static + ?Sized,
    C: CommitSink<Op>,
    RM: RuntimeMetrics + Send + Sync + 'static + ?Sized,
{
    let BusChannels {
        intake_tx,
        mut intake_rx,
    } = channels;
    drop(intake_tx);

    let (result_tx, result_rx) = mpsc::channel::<ExecutionResult<Op>>(flow.channel_capacity());
    let collector = tokio::spawn(collect_results(result_rx, sink));

    let mut stats = KernelRunStats::default();
    let mut workers: JoinSet<Result<(), IngestError>> = JoinSet::new();
    let mut first_error: Option<IngestError> = None;

    loop {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            message = intake_rx.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = flow.acquire_in_flight() => match permit {
                Ok(permit) => permit,
                Err(err) => {
                    record_error(&mut first_error, err, &cancel);
                    break;
                }
            },
        };

        stats.dispatched += 1;
        metrics.observe_queue_depth("intake", intake_rx.len());
        debug!(msg_id = %message.msg_id, in_flight = flow.in_flight(), "dispatching");

        let executor = Arc::clone(&executor);
        let result_tx = result_tx.clone();
        let token = cancel.child_token();
        workers.spawn(async move {
            let _permit = permit;
            let result = executor.execute(message, token).await?;
            result_tx
                .send(result)
                .await
                .map_err(|_| IngestError::Commit("result collector closed".to_string()))
        });

        while let Some(joined) = workers.try_join_next() {
            if let Err(err) = settle(joined) {
                record_error(&mut first_error, err, &cancel);
            }
        }
        if first_error.is_some() {
            break;
        }
    }

    drop(intake_rx);
    drop(result_tx);

    while let Some(joined) = workers.join_next().await {
        if let Err(err) = settle(joined) {
            record_error(&mut first_error, err, &cancel);
        }
    }

    let (sink, committed, failed) = collector
        .await
        .map_err(|e| IngestError::Commit(format!("collector join failure: {e}")))??;
    stats.committed = committed;
    stats.failed = failed;

    metrics.observe_throughput("dispatched", stats.dispatched);
    metrics.observe_throughput("committed", stats.committed);

    if let Some(err) = first_error {
        return Err(err);
    }
    if cancel.is_cancelled() {
        return Err(IngestError::Cancelled);
    }

    Ok(KernelOutcome { stats, sink })
}

async fn collect_results<Op, C>(
    mut results: mpsc::Receiver<ExecutionResult<Op>>,
    mut sink: C,
) -> Result<(C, usize, usize), IngestError>
where
    Op: Send + 'static,
    C: CommitSink<Op>,
{
    let mut committed = 0usize;
    let mut failed = 0usize;

    while let Some(result) = results.recv().await {
        if result.is_failed() {
            failed += 1;
        }
        sink = tokio::task::spawn_blocking(move || sink.commit(result).map(|()| sink))
            .await
            .map_err(|e| IngestError::Commit(format!("commit join failure: {e}")))??;
        committed += 1;
    }

    Ok((sink, committed, failed))
}

fn settle(joined: Result<Result<(), IngestError>, JoinError>) -> Result<(), IngestError> {
    joined.map_err(|e| IngestError::Execution(format!("worker join failure: {e}")))?
}

fn record_error(slot: &mut Option<IngestError>, err: IngestError, cancel: &CancellationToken) {
    if slot.is_none() {
        if !err.is_cancelled() {
            warn!("stopping dispatch: {err}");
        }
        cancel.cancel();
        *slot = Some(err);
    }
}
