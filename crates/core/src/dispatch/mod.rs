//! Stage one: run the AST dump tool over every selected compile command.

mod executor;
mod registry;
mod sink;

pub use executor::{AST_DUMP_FLAGS, ClangExecutor, ToolInvocation, ToolOutput};
pub use registry::{ChildRegistry, Registration};
pub use sink::{DumpSink, FailureList, dump_file_name};

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use astref_ingest::{
    CancellationToken, DynExecutor, IngestError, IngestRuntime, KernelOutcome, Message,
    RuntimeMetrics,
};
use tracing::{debug, info, trace, warn};

use crate::compdb::CompileCommand;
use crate::config::GenAstConfig;
use crate::error::{AstrefError, Result};
use crate::filter::PathFilter;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: Vec<PathBuf>,
    pub written: usize,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Reports runtime progress through `tracing`.
pub struct TracingMetrics;

impl RuntimeMetrics for TracingMetrics {
    fn observe_queue_depth(&self, queue: &'static str, depth: usize) {
        trace!(queue, depth, "queue depth");
    }

    fn observe_throughput(&self, stage: &'static str, count: usize) {
        debug!(stage, count, "throughput");
    }
}

/// Keeps the commands whose resolved path matches `filter`.
pub fn select_commands(commands: Vec<CompileCommand>, filter: &PathFilter) -> Vec<CompileCommand> {
    commands
        .into_iter()
        .filter(|command| {
            let keep = filter.matches(&command.absolute_path());
            if !keep {
                trace!("Skipping {}", command.absolute_path().display());
            }
            keep
        })
        .collect()
}

/// Runs the dispatcher, echoing tool diagnostics to the process stderr.
pub async fn run_dispatch(
    config: &GenAstConfig,
    commands: Vec<CompileCommand>,
    cancel: CancellationToken,
) -> Result<DispatchReport> {
    let (report, _) = dispatch_with_diagnostics(config, commands, cancel, std::io::stderr()).await?;
    Ok(report)
}

/// Runs the dispatcher with tool diagnostics echoed to `diagnostics`, which
/// is handed back once every item has been committed.
pub async fn dispatch_with_diagnostics<W>(
    config: &GenAstConfig,
    commands: Vec<CompileCommand>,
    cancel: CancellationToken,
    diagnostics: W,
) -> Result<(DispatchReport, W)>
where
    W: Write + Send + 'static,
{
    let filter = PathFilter::new(&config.patterns)?;
    let total = commands.len();
    let selected = select_commands(commands, &filter);
    let runtime_config = config.runtime_config();
    info!(
        "Dispatching {} of {} compile commands, {} at a time",
        selected.len(),
        total,
        runtime_config.max_in_flight
    );

    let registry = Arc::new(ChildRegistry::default());
    let executor: DynExecutor<CompileCommand, ToolOutput> = Arc::new(ClangExecutor::new(
        config.clang_binary.clone(),
        Arc::clone(&registry),
    ));
    let runtime = IngestRuntime::new(
        runtime_config,
        executor,
        DumpSink::new(config.output_dir.clone(), diagnostics),
        Arc::new(TracingMetrics),
    );

    let intake = runtime.intake_handle();
    let feeder = tokio::spawn(async move {
        for command in selected {
            let msg_id = command.absolute_path().display().to_string();
            if intake.submit(Message::new(msg_id, command)).await.is_err() {
                break;
            }
        }
    });

    let reaper = {
        let registry = Arc::clone(&registry);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            let signalled = registry.terminate_all();
            if signalled > 0 {
                warn!("Terminating {signalled} running tool process(es)");
            }
        })
    };

    let outcome = runtime.run(cancel).await;
    reaper.abort();
    for (pid, path) in registry.snapshot() {
        warn!("{} (pid {:?}) outlived the run", path.display(), pid);
    }

    let KernelOutcome { stats, sink } = outcome?;
    feeder.await.map_err(|e| {
        AstrefError::Ingest(IngestError::Execution(format!("intake feeder failed: {e}")))
    })?;

    let (failures, written, diagnostics) = sink.into_parts();
    let report = DispatchReport {
        dispatched: stats.dispatched,
        succeeded: stats.committed.saturating_sub(stats.failed),
        failed: failures.into_paths(),
        written,
    };
    info!(
        "Dispatched {}, {} succeeded, {} failed",
        report.dispatched,
        report.succeeded,
        report.failed.len()
    );
    Ok((report, diagnostics))
}
