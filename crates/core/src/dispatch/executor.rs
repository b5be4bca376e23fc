use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use astref_ingest::{CancellationToken, ExecutionResult, Executor, IngestError, Message};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use super::registry::ChildRegistry;
use crate::compdb::CompileCommand;
use crate::path::substitute_arguments;

pub const AST_DUMP_FLAGS: [&str; 3] = ["-Xclang", "-ast-dump=json", "-fsyntax-only"];

/// Fully resolved command line for one compile command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub absolute: PathBuf,
}

impl ToolInvocation {
    pub fn for_command(program: &Path, command: &CompileCommand) -> Self {
        let absolute = command.absolute_path();
        let mut args: Vec<String> = AST_DUMP_FLAGS.iter().map(|flag| flag.to_string()).collect();
        args.extend(substitute_arguments(
            &command.arguments,
            &command.file,
            &absolute,
        ));
        Self {
            program: program.to_path_buf(),
            args,
            working_dir: command.directory.clone(),
            absolute,
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What one tool run produced.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Source path as recorded in the database; names the dump file.
    pub file: String,
    pub absolute: PathBuf,
    /// `None` when the tool never ran or was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Runs the AST dump tool for each compile command.
///
/// Non-zero exits and spawn failures come back as failed results; only
/// cancellation is an error, since it must stop the whole run.
pub struct ClangExecutor {
    program: PathBuf,
    registry: Arc<ChildRegistry>,
}

impl ClangExecutor {
    pub fn new(program: PathBuf, registry: Arc<ChildRegistry>) -> Self {
        Self { program, registry }
    }
}

#[async_trait]
impl Executor<CompileCommand, ToolOutput> for ClangExecutor {
    async fn execute(
        &self,
        message: Message<CompileCommand>,
        cancel: CancellationToken,
    ) -> Result<ExecutionResult<ToolOutput>, IngestError> {
        let Message { msg_id, payload } = message;
        let invocation = ToolInvocation::for_command(&self.program, &payload);
        debug!("Running {invocation}");

        let mut output = ToolOutput {
            file: payload.file,
            absolute: invocation.absolute.clone(),
            ..ToolOutput::default()
        };

        let mut child = match invocation.command().spawn() {
            Ok(child) => child,
            Err(err) => {
                let reason = format!("failed to run `{}`: {err}", self.program.display());
                output.stderr = reason.clone().into_bytes();
                return Ok(ExecutionResult::failed(msg_id, output, reason));
            }
        };

        let registration = self
            .registry
            .register(child.id(), &invocation.absolute, &cancel);
        let kill = registration.kill_token();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = {
            let collect = async {
                tokio::try_join!(read_pipe(stdout), read_pipe(stderr), child.wait())
            };
            tokio::select! {
                result = collect => Some(result),
                _ = kill.cancelled() => None,
            }
        };

        let Some(finished) = finished else {
            warn!(
                "Terminating {} (pid {:?})",
                invocation.absolute.display(),
                registration.pid()
            );
            let _ = child.start_kill();
            let _ = child.wait().await;
            return Err(IngestError::Cancelled);
        };
        drop(registration);

        match finished {
            Ok((stdout, stderr, status)) => {
                output.stdout = stdout;
                output.stderr = stderr;
                output.exit_code = status.code();
                if status.success() {
                    Ok(ExecutionResult::done(msg_id, output))
                } else {
                    Ok(ExecutionResult::failed(msg_id, output, status.to_string()))
                }
            }
            Err(err) => {
                let reason = format!(
                    "lost output of `{}` for {}: {err}",
                    self.program.display(),
                    invocation.absolute.display()
                );
                output.stderr = reason.clone().into_bytes();
                Ok(ExecutionResult::failed(msg_id, output, reason))
            }
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}
