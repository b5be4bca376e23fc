//! Run configuration assembled by the command line.

use std::path::PathBuf;

use astref_ingest::RuntimeConfig;

use crate::aggregate::ParseMode;
use crate::compdb::{DATABASE_FILE_NAME, find_compilation_database};
use crate::error::{AstrefError, Result};
use crate::filter::{MATCH_ALL, PathFilter};

/// Settings for the AST dump stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenAstConfig {
    pub clang_binary: PathBuf,
    pub output_dir: PathBuf,
    /// Zero means one per available processing unit.
    pub jobs: usize,
    /// Directory holding `compile_commands.json`; searched for when unset.
    pub build_path: Option<PathBuf>,
    pub patterns: Vec<String>,
}

impl Default for GenAstConfig {
    fn default() -> Self {
        Self {
            clang_binary: PathBuf::from("clang"),
            output_dir: PathBuf::from("."),
            jobs: 0,
            build_path: None,
            patterns: vec![MATCH_ALL.to_string()],
        }
    }
}

impl GenAstConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.output_dir.is_dir() {
            return Err(AstrefError::Config(format!(
                "invalid output directory `{}`",
                self.output_dir.display()
            )));
        }
        PathFilter::new(&self.patterns)?;
        Ok(())
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        let dir = match &self.build_path {
            Some(dir) => dir.clone(),
            None => find_compilation_database(&std::env::current_dir()?)?,
        };
        Ok(dir.join(DATABASE_FILE_NAME))
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig::with_parallelism(self.jobs)
    }
}

/// Settings for the identifier extraction stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifiersConfig {
    pub inputs: Vec<PathBuf>,
    pub mode: ParseMode,
    /// Report destination; stdout when unset.
    pub output: Option<PathBuf>,
}

impl IdentifiersConfig {
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(AstrefError::Config(
                "at least one AST dump is required".to_string(),
            ));
        }
        Ok(())
    }
}
