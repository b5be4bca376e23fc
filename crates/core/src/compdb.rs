//! Compilation database (`compile_commands.json`) loading and discovery.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{AstrefError, Result};
use crate::path::make_absolute;

pub const DATABASE_FILE_NAME: &str = "compile_commands.json";

/// One translation unit as recorded by the build system.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCompileCommand")]
pub struct CompileCommand {
    pub directory: PathBuf,
    /// Source path exactly as recorded; may be relative to `directory`.
    pub file: String,
    /// Compiler invocation, compiler first.
    pub arguments: Vec<String>,
}

impl CompileCommand {
    pub fn absolute_path(&self) -> PathBuf {
        make_absolute(&self.file, &self.directory)
    }
}

#[derive(Deserialize)]
struct RawCompileCommand {
    directory: PathBuf,
    file: String,
    #[serde(default)]
    arguments: Option<Vec<String>>,
    #[serde(default)]
    command: Option<String>,
}

impl TryFrom<RawCompileCommand> for CompileCommand {
    type Error = String;

    fn try_from(raw: RawCompileCommand) -> std::result::Result<Self, Self::Error> {
        let arguments = match (raw.arguments, raw.command) {
            (Some(arguments), _) => arguments,
            (None, Some(command)) => shlex::split(&command)
                .ok_or_else(|| format!("unbalanced quoting in command for `{}`", raw.file))?,
            (None, None) => {
                return Err(format!(
                    "entry for `{}` has neither `arguments` nor `command`",
                    raw.file
                ));
            }
        };

        Ok(Self {
            directory: raw.directory,
            file: raw.file,
            arguments,
        })
    }
}

pub fn parse(content: &str) -> Result<Vec<CompileCommand>> {
    serde_json::from_str(content).map_err(|e| {
        AstrefError::Config(format!("invalid compilation database: {e}"))
    })
}

pub fn load(path: &Path) -> Result<Vec<CompileCommand>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AstrefError::Config(format!(
            "could not read compilation database `{}`: {e}",
            path.display()
        ))
    })?;
    let commands = parse(&content)?;
    debug!(
        "Loaded {} compile commands from {}",
        commands.len(),
        path.display()
    );
    Ok(commands)
}

/// Searches `start` and each of its parents for `compile_commands.json`,
/// returning the directory that contains it.
pub fn find_compilation_database(start: &Path) -> Result<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .find(|dir| dir.join(DATABASE_FILE_NAME).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| AstrefError::Config("could not find compilation database".to_string()))
}
