use std::error::Error;
use std::process::ExitCode;

use astref_core::compdb;
use astref_core::config::GenAstConfig;
use astref_core::dispatch::run_dispatch;
use astref_ingest::CancellationToken;
use tracing::{error, info, warn};

/// Conventional status for a run stopped by SIGINT.
const INTERRUPTED: u8 = 130;

pub async fn run(config: GenAstConfig) -> Result<ExitCode, Box<dyn Error>> {
    config.validate()?;
    let database = config.database_path()?;
    info!("Using compilation database {}", database.display());
    let commands = compdb::load(&database)?;

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping clang processes...");
                cancel.cancel();
            }
        })
    };

    let result = run_dispatch(&config, commands, cancel).await;
    interrupt.abort();

    match result {
        Ok(report) if report.is_success() => {
            info!("Wrote {} AST dumps to {}", report.written, config.output_dir.display());
            Ok(ExitCode::SUCCESS)
        }
        Ok(report) => {
            error!("{} of {} files failed:", report.failed.len(), report.dispatched);
            for path in &report.failed {
                error!("  {}", path.display());
            }
            Ok(ExitCode::FAILURE)
        }
        Err(err) if err.is_cancelled() => {
            warn!("Run cancelled");
            Ok(ExitCode::from(INTERRUPTED))
        }
        Err(err) => Err(err.into()),
    }
}
