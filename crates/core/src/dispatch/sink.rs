use std::io::Write;
use std::path::{MAIN_SEPARATOR, PathBuf};

use astref_ingest::{CommitSink, ExecutionResult, IngestError};
use tracing::debug;

use super::executor::ToolOutput;

/// `src/lib/a.c` becomes `src_lib_a.c.json`.
pub fn dump_file_name(file: &str) -> String {
    format!("{}.json", file.replace(MAIN_SEPARATOR, "_"))
}

/// Absolute paths of items whose tool invocation failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureList {
    paths: Vec<PathBuf>,
}

impl FailureList {
    pub fn record(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        self.paths
    }
}

/// Writes each tool's stdout to its dump file and echoes its stderr.
///
/// Runs on the runtime's single collector task, so diagnostics from
/// different items never interleave.
pub struct DumpSink<W> {
    output_dir: PathBuf,
    diagnostics: W,
    failures: FailureList,
    written: usize,
}

impl<W> DumpSink<W>
where
    W: Write + Send + 'static,
{
    pub fn new(output_dir: PathBuf, diagnostics: W) -> Self {
        Self {
            output_dir,
            diagnostics,
            failures: FailureList::default(),
            written: 0,
        }
    }

    pub fn into_parts(self) -> (FailureList, usize, W) {
        (self.failures, self.written, self.diagnostics)
    }
}

impl<W> CommitSink<ToolOutput> for DumpSink<W>
where
    W: Write + Send + 'static,
{
    fn commit(&mut self, result: ExecutionResult<ToolOutput>) -> Result<(), IngestError> {
        let failed = result.is_failed();
        let output = result.output;

        if failed {
            debug!(
                "{} failed: {}",
                output.absolute.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
            self.failures.record(output.absolute.clone());
        }

        let path = self.output_dir.join(dump_file_name(&output.file));
        std::fs::write(&path, &output.stdout).map_err(|e| {
            IngestError::Commit(format!("could not write {}: {e}", path.display()))
        })?;
        self.written += 1;

        if !output.stderr.is_empty() {
            self.diagnostics
                .write_all(&output.stderr)
                .and_then(|()| self.diagnostics.write_all(b"\n"))
                .and_then(|()| self.diagnostics.flush())
                .map_err(|e| IngestError::Commit(format!("could not echo diagnostics: {e}")))?;
        }

        Ok(())
    }
}
