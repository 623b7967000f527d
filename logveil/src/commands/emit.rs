//! `logveil log`: writes one structured entry through a configured logger.
//!
//! License: MIT OR APACHE 2.0

use anyhow::{Context, Result};
use log::debug;

use crate::cli::LogCommand;
use crate::config::LoggerConfig;
use crate::field::Field;
use crate::level::Level;
use crate::logger::Logger;

/// Resolves the logger configuration for the command: the `--config` file, the
/// user's default config file, or built-in defaults, with `--format` on top.
pub fn resolve_config(cmd: &LogCommand) -> Result<LoggerConfig> {
    let mut config = LoggerConfig::discover(cmd.config.as_deref())?;
    if let Some(format) = cmd.format {
        config.format = format;
    }
    // The command writes exactly what it is told to, whatever the configured threshold.
    config.level = config.level.min(cmd.level);
    Ok(config)
}

pub fn emit(logger: &Logger, cmd: &LogCommand) {
    let fields: Vec<Field> = cmd
        .fields
        .iter()
        .map(|(key, value)| Field::new(key.as_str(), value.as_str()))
        .collect();
    match cmd.level {
        Level::Fatal => logger.fatal_with(&cmd.message, &fields),
        level => logger.log_with_fields(level, &cmd.message, &fields),
    }
}

pub fn run(cmd: &LogCommand) -> Result<()> {
    let config = resolve_config(cmd)?;
    debug!("Writing {} entry to {} outputs.", cmd.level, config.outputs.len());
    let logger = config.build()?;
    emit(&logger, cmd);
    logger.close().context("Failed to flush log outputs")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatKind;
    use crate::writer::MemoryWriter;

    fn command(level: Level, fields: &[(&str, &str)]) -> LogCommand {
        LogCommand {
            message: "db connect to postgres://app:s3cret@db:5432/main".to_string(),
            level,
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            format: Some(FormatKind::Json),
            config: None,
        }
    }

    #[test]
    fn test_emit_redacts_message_and_fields() {
        let sink = MemoryWriter::new();
        let logger = Logger::builder().writer(sink.clone()).build().unwrap();
        emit(&logger, &command(Level::Warn, &[("api_key", "abc123"), ("region", "eu-west-1")]));
        let out = sink.contents();
        assert!(!out.contains("s3cret"));
        assert!(out.contains("api_key=[REDACTED]"));
        assert!(out.contains("region=eu-west-1"));
        assert!(out.contains("WARN"));
    }

    #[test]
    fn test_resolve_config_lowers_threshold() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("logger.yaml");
        std::fs::write(&path, "level: error\nformat: text\n")?;
        let mut cmd = command(Level::Debug, &[]);
        cmd.config = Some(path);
        let config = resolve_config(&cmd)?;
        assert_eq!(config.level, Level::Debug);
        assert_eq!(config.format, FormatKind::Json);
        Ok(())
    }
}
