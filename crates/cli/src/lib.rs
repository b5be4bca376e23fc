mod gen_ast;
mod identifiers;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use astref_core::aggregate::ParseMode;
use astref_core::config::{GenAstConfig, IdentifiersConfig};
use astref_core::filter::MATCH_ALL;
use astref_core::logging::init_logging;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "astref",
    version,
    about = "Collects the identifiers a C/C++ code base references",
    long_about = "Runs clang's JSON AST dump over every translation unit of a compilation \
                  database, then reduces the dumps to a CSV of referenced identifiers \
                  (enumerators, functions, parameters and variables)."
)]
pub struct Cli {
    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log to the log file
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dump the AST of every translation unit in compile_commands.json
    #[command(
        long_about = "Runs `<clang> -Xclang -ast-dump=json -fsyntax-only` for each entry of the \
                      compilation database whose absolute path matches one of FILES, writing \
                      each dump to OUTPUT as `<path with separators replaced by _>.json`."
    )]
    GenAst {
        /// Clang executable to run
        #[arg(short = 'c', long, value_name = "PATH", default_value = "clang")]
        clang_binary: PathBuf,

        /// Directory receiving the dumps
        #[arg(short, long, value_name = "DIR", required = true)]
        output: PathBuf,

        /// Parallel clang processes (0 = one per CPU)
        #[arg(short, long, default_value_t = 0)]
        jobs: usize,

        /// Directory containing compile_commands.json; searched upwards from
        /// the current directory when omitted
        #[arg(short = 'p', long, value_name = "DIR")]
        build_path: Option<PathBuf>,

        /// Regular expressions selecting files by absolute path
        #[arg(value_name = "FILES", default_value = MATCH_ALL)]
        files: Vec<String>,
    },
    /// Extract referenced identifiers from AST dumps as CSV
    Identifiers {
        /// AST dump files produced by gen-ast
        #[arg(value_name = "DUMP", required = true)]
        dumps: Vec<PathBuf>,

        /// Fail on a malformed dump instead of skipping it
        #[arg(long)]
        strict: bool,

        /// Write the report here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

pub fn run() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();

    let component = match &cli.command {
        Commands::GenAst { .. } => "gen-ast",
        Commands::Identifiers { .. } => "identifiers",
    };
    let level = if cli.verbose { "debug" } else { "info" };
    let _guard = init_logging(component, !cli.quiet, level)?;

    match cli.command {
        Commands::GenAst {
            clang_binary,
            output,
            jobs,
            build_path,
            files,
        } => {
            let config = GenAstConfig {
                clang_binary,
                output_dir: output,
                jobs,
                build_path,
                patterns: files,
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(gen_ast::run(config))
        }
        Commands::Identifiers {
            dumps,
            strict,
            output,
        } => identifiers::run(IdentifiersConfig {
            inputs: dumps,
            mode: if strict {
                ParseMode::Strict
            } else {
                ParseMode::Tolerant
            },
            output,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn gen_ast_requires_an_output_directory() {
        let err = Cli::try_parse_from(["astref", "gen-ast"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn gen_ast_defaults() {
        let cli = Cli::try_parse_from(["astref", "gen-ast", "-o", "dumps"]).unwrap();
        match cli.command {
            Commands::GenAst {
                clang_binary,
                output,
                jobs,
                build_path,
                files,
            } => {
                assert_eq!(clang_binary, PathBuf::from("clang"));
                assert_eq!(output, PathBuf::from("dumps"));
                assert_eq!(jobs, 0);
                assert_eq!(build_path, None);
                assert_eq!(files, vec![".*"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn gen_ast_flags_and_patterns() {
        let cli = Cli::try_parse_from([
            "astref", "-v", "gen-ast", "-c", "clang-18", "-o", "out", "-j", "4", "-p", "build",
            "src/.*", "lib/.*",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::GenAst {
                clang_binary,
                jobs,
                build_path,
                files,
                ..
            } => {
                assert_eq!(clang_binary, PathBuf::from("clang-18"));
                assert_eq!(jobs, 4);
                assert_eq!(build_path, Some(PathBuf::from("build")));
                assert_eq!(files, vec!["src/.*", "lib/.*"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn identifiers_requires_a_dump() {
        assert!(Cli::try_parse_from(["astref", "identifiers"]).is_err());

        let cli =
            Cli::try_parse_from(["astref", "identifiers", "--strict", "a.json", "b.json", "-q"])
                .unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Identifiers { dumps, strict, .. } => {
                assert!(strict);
                assert_eq!(dumps.len(), 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["astref", "-v", "-q", "identifiers", "a.json"]).is_err());
    }
}
