use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter};
use std::process::ExitCode;

use astref_core::aggregate::IdentifierAggregator;
use astref_core::config::IdentifiersConfig;
use astref_core::report::write_report;
use tracing::{info, warn};

pub fn run(config: IdentifiersConfig) -> Result<ExitCode, Box<dyn Error>> {
    config.validate()?;

    let mut aggregator = IdentifierAggregator::new(config.mode);
    aggregator.add_files(&config.inputs)?;

    let summary = aggregator.summary();
    info!(
        "Read {} documents from {} dumps, {} unique identifiers",
        summary.documents, summary.files, summary.identifiers
    );
    if !summary.skipped.is_empty() {
        warn!("Skipped {} malformed dumps:", summary.skipped.len());
        for skipped in &summary.skipped {
            warn!("  {}", skipped.path.display());
        }
    }

    let records = aggregator.into_records();
    match &config.output {
        Some(path) => write_report(BufWriter::new(File::create(path)?), &records)?,
        None => write_report(io::stdout().lock(), &records)?,
    }

    Ok(ExitCode::SUCCESS)
}
