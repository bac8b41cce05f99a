// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `sitegen`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "sitegen",
    version,
    about = "Build a site from a source tree through an ordered pipeline of stages.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the folder to process.
    ///
    /// Optional at the parser level so that a missing source is reported by
    /// startup validation with a proper exit code.
    #[arg(short, long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Monitor the source tree for changes and rebuild on every change.
    #[arg(short, long)]
    pub monitor: bool,

    /// Load a custom JSON env file that is passed to every stage.
    #[arg(short, long = "env-file", value_name = "FILE")]
    pub env_file: Option<PathBuf>,

    /// Path to the project config (TOML).
    ///
    /// Default: `sitegen.toml` inside the source directory. A missing default
    /// file means "use the built-in pipeline".
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, the `SITEGEN_LOG` filter directives or `info` are used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the setup and print the pipeline, but don't run any stage.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let args = CliArgs::try_parse_from(["sitegen", "-s", "site", "-m", "-e", "prod.json"])
            .expect("valid args");
        assert_eq!(args.source, Some(PathBuf::from("site")));
        assert!(args.monitor);
        assert_eq!(args.env_file, Some(PathBuf::from("prod.json")));
    }

    #[test]
    fn source_is_optional_for_the_parser() {
        let args = CliArgs::try_parse_from(["sitegen"]).expect("valid args");
        assert!(args.source.is_none());
        assert!(!args.monitor);
    }
}
