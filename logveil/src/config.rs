//! YAML configuration for a whole logger.
//!
//! ```yaml
//! level: info
//! format: json
//! color: false
//! outputs: [stdout, /var/log/app/app.log]
//! max_message_size: 1048576
//! filter:
//!   tier: full
//!   patterns: ['(?i)employee_id=(\d+)']
//! ```
//!
//! License: MIT OR APACHE 2.0

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info};
use logveil_core::FilterConfig;
use serde::{Deserialize, Serialize};

use crate::format::FormatKind;
use crate::level::Level;
use crate::logger::Logger;
use crate::security::{SecurityConfig, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_MAX_WRITERS};
use crate::writer::Output;

/// File name looked up in the user's config directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    pub level: Level,
    pub format: FormatKind,
    pub color: bool,
    pub outputs: Vec<Output>,
    pub max_message_size: usize,
    pub max_writers: usize,
    /// `None` (an explicit `filter: null`) disables redaction.
    pub filter: Option<FilterConfig>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: FormatKind::Text,
            color: false,
            outputs: vec![Output::Stderr],
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_writers: DEFAULT_MAX_WRITERS,
            filter: Some(FilterConfig::default()),
        }
    }
}

/// `<config dir>/logveil/config.yaml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("logveil").join(DEFAULT_CONFIG_FILE))
}

impl LoggerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading logger config from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid logger config in {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: LoggerConfig = serde_yaml::from_str(text).context("Failed to parse logger config")?;
        if let Some(filter) = &config.filter {
            filter.validate()?;
        }
        Ok(config)
    }

    /// Loads the config at `path`, or the default location when `path` is
    /// `None`, falling back to built-in defaults when nothing exists there.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match default_config_path() {
            Some(candidate) if candidate.is_file() => Self::load_from_file(candidate),
            _ => {
                debug!("No logger config found, using defaults.");
                Ok(Self::default())
            }
        }
    }

    pub fn security(&self) -> Result<SecurityConfig> {
        let sensitive_filter = match &self.filter {
            Some(filter) => Some(Arc::new(filter.build()?)),
            None => None,
        };
        Ok(SecurityConfig {
            max_message_size: self.max_message_size,
            max_writers: self.max_writers,
            sensitive_filter,
        })
    }

    /// Opens every output and builds the logger.
    pub fn build(&self) -> Result<Logger> {
        let mut builder = Logger::builder()
            .level(self.level)
            .boxed_formatter(self.format.build(self.color))
            .security(self.security()?);
        for output in &self.outputs {
            let writer = output
                .open()
                .with_context(|| format!("Failed to open log output {}", output))?;
            builder = builder.boxed_writer(writer);
        }
        builder.build().context("Failed to build logger")
    }
}
