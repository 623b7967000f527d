// logveil/src/cli.rs
//! Command-line interface for the `logveil` binary.
//! License: MIT OR APACHE 2.0

use clap::{Parser, Subcommand, ValueEnum};
use logveil_core::PresetTier;
use std::path::PathBuf;

use crate::format::FormatKind;
use crate::level::Level;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "logveil",
    author = "Obscura Tech",
    version = env!("CARGO_PKG_VERSION"),
    about = "Redact secrets from logs and emit structured log entries",
    long_about = "logveil runs text through the same sensitive-data filter used by the logveil logging library. It can redact piped log output, check custom patterns for backtracking hazards before they are deployed, list the built-in detectors, and write single structured log entries.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging for the logveil crates
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Redacts an input file or stdin line by line.
    #[command(about = "Redacts sensitive data from an input file or stdin.")]
    Filter(FilterCommand),

    /// Validates custom patterns without using them.
    #[command(about = "Checks custom patterns for syntax errors and backtracking hazards.")]
    Check(CheckCommand),

    /// Lists the detectors in a built-in tier.
    #[command(about = "Lists the built-in detectors of a tier.")]
    Patterns(PatternsCommand),

    /// Writes a single structured entry through a configured logger.
    #[command(about = "Writes one structured, redacted log entry.")]
    Log(LogCommand),
}

/// Arguments for the `filter` command.
#[derive(Parser, Debug)]
pub struct FilterCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Write redacted output to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, env = "LOGVEIL_TIER", default_value = "full", help = "Built-in detector tier to start from.")]
    pub tier: TierChoice,

    /// Extra patterns, added after the tier.
    #[arg(long = "pattern", short = 'p', value_name = "REGEX", help = "Add a custom pattern (repeatable).")]
    pub patterns: Vec<String>,

    /// A filter configuration file; overrides `--tier`.
    #[arg(long, value_name = "FILE", env = "LOGVEIL_FILTER_CONFIG", help = "Path to a filter configuration file (YAML).")]
    pub config: Option<PathBuf>,

    #[arg(long = "timeout-ms", value_name = "MS", help = "Per-call redaction deadline in milliseconds.")]
    pub timeout_ms: Option<u64>,

    #[arg(long, help = "Build the filter but leave it disabled, passing input through unchanged.")]
    pub disable: bool,
}

/// Arguments for the `check` command.
#[derive(Parser, Debug)]
pub struct CheckCommand {
    #[arg(value_name = "REGEX", required = true, help = "Patterns to validate.")]
    pub patterns: Vec<String>,
}

/// Arguments for the `patterns` command.
#[derive(Parser, Debug)]
pub struct PatternsCommand {
    #[arg(long, value_enum, default_value = "full", help = "Tier to list.")]
    pub tier: TierChoice,

    #[arg(long = "show-source", help = "Print each detector's regular expression.")]
    pub show_source: bool,
}

/// Arguments for the `log` command.
#[derive(Parser, Debug)]
pub struct LogCommand {
    #[arg(value_name = "MESSAGE", help = "The message to log.")]
    pub message: String,

    #[arg(long, short = 'l', default_value = "info", help = "Entry level (debug, info, warn, error).")]
    pub level: Level,

    /// Structured fields as `key=value`.
    #[arg(long = "field", short = 'f', value_name = "KEY=VALUE", value_parser = parse_key_value, help = "Attach a field (repeatable).")]
    pub fields: Vec<(String, String)>,

    #[arg(long, value_enum, help = "Output format; overrides the config file.")]
    pub format: Option<FormatKind>,

    #[arg(long, value_name = "FILE", env = "LOGVEIL_CONFIG", help = "Path to a logger configuration file (YAML).")]
    pub config: Option<PathBuf>,
}

/// Tier names accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TierChoice {
    /// No built-in detectors.
    None,
    /// Credentials, cards, phone numbers, database strings.
    Basic,
    /// Basic plus tokens, cloud keys and IP addresses.
    Full,
}

impl From<TierChoice> for PresetTier {
    fn from(choice: TierChoice) -> Self {
        match choice {
            TierChoice::None => PresetTier::None,
            TierChoice::Basic => PresetTier::Basic,
            TierChoice::Full => PresetTier::Full,
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("dsn=a=b").unwrap(),
            ("dsn".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("=x").is_err());
        assert!(parse_key_value("novalue").is_err());
    }

    #[test]
    fn test_cli_parses_filter_flags() {
        let cli = Cli::try_parse_from(["logveil", "-q", "filter", "--tier", "basic", "-p", r"id=(\d+)"]).unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Filter(cmd) => {
                assert_eq!(PresetTier::from(cmd.tier), PresetTier::Basic);
                assert_eq!(cmd.patterns, vec![r"id=(\d+)".to_string()]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
