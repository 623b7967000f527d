//! Configuration for `logveil-core`.
//!
//! Holds the fixed marker constants, the numeric limits that bound a single
//! redaction call, and the YAML-backed `FilterConfig` used to build a filter
//! from a file.
//!
//! License: MIT OR APACHE 2.0

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::filter::SensitiveDataFilter;
use crate::patterns::{self, PresetTier};

/// Maximum allowed length (in bytes) for a user-supplied pattern.
pub const MAX_PATTERN_LENGTH: usize = 1000;

/// Largest repetition count a user pattern may request (`a{1,1000}` is fine).
pub const MAX_REPETITION_BOUND: u64 = 1000;

/// Replaces every detected secret.
pub const REDACTED: &str = "[REDACTED]";

/// Replaces a shared reference already visited on the current path.
pub const CIRCULAR_REFERENCE: &str = "[CIRCULAR_REFERENCE]";

/// Replaces a subtree nested deeper than `MAX_RECURSION_DEPTH`.
pub const MAX_DEPTH_EXCEEDED: &str = "[MAX_DEPTH_EXCEEDED]";

/// Appended when oversized input is cut.
pub const TRUNCATION_SUFFIX: &str = "...[TRUNCATED]";

/// Depth at which the value walker stops descending.
pub const MAX_RECURSION_DEPTH: usize = 100;

/// Budget for a filter with patterns.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(50);

/// Budget for a filter constructed with no patterns.
pub const EMPTY_FILTER_TIMEOUT: Duration = Duration::from_millis(10);

/// Bounds applied to a single `filter` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedactionLimits {
    /// Inputs shorter than this are scanned inline with no worker.
    pub fast_path_threshold: usize,
    /// Inputs longer than this are truncated before scanning.
    pub max_input_length: usize,
    /// Commit width of one chunk.
    pub chunk_size: usize,
    /// How far each chunk's scan window extends past its commit boundary.
    pub chunk_overlap: usize,
    /// Bytes scanned on each side of a truncation cut.
    pub boundary_window: usize,
    /// Wall-clock budget for one call.
    pub timeout: Duration,
    /// Worker threads allowed in flight per filter.
    pub max_concurrent_workers: i32,
}

impl Default for RedactionLimits {
    fn default() -> Self {
        Self {
            fast_path_threshold: 100,
            max_input_length: 1 << 20,
            chunk_size: 64 * 1024,
            chunk_overlap: 512,
            boundary_window: 512,
            timeout: DEFAULT_TIMEOUT,
            max_concurrent_workers: 100,
        }
    }
}

impl RedactionLimits {
    /// Same limits with a different timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Optional overrides for `RedactionLimits`, as they appear in YAML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitOverrides {
    pub timeout_ms: Option<u64>,
    pub max_input_length: Option<usize>,
    pub chunk_size: Option<usize>,
    pub max_concurrent_workers: Option<i32>,
}

impl LimitOverrides {
    pub fn apply(&self, mut limits: RedactionLimits) -> RedactionLimits {
        if let Some(ms) = self.timeout_ms {
            limits.timeout = Duration::from_millis(ms);
        }
        if let Some(n) = self.max_input_length {
            limits.max_input_length = n;
        }
        if let Some(n) = self.chunk_size {
            limits.chunk_size = n;
        }
        if let Some(n) = self.max_concurrent_workers {
            limits.max_concurrent_workers = n;
        }
        limits
    }
}

/// Serializable description of a `SensitiveDataFilter`.
///
/// ```yaml
/// tier: basic
/// enabled: true
/// patterns:
///   - '(?i)employee_id=(\d+)'
/// limits:
///   timeout_ms: 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    pub tier: PresetTier,
    pub enabled: bool,
    pub patterns: Vec<String>,
    pub limits: LimitOverrides,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            tier: PresetTier::Full,
            enabled: true,
            patterns: Vec::new(),
            limits: LimitOverrides::default(),
        }
    }
}

impl FilterConfig {
    /// Loads and validates a filter configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading filter config from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&text)
            .with_context(|| format!("Invalid filter config in {}", path.display()))?;
        info!(
            "Loaded filter config ({} tier, {} extra patterns) from {}.",
            config.tier,
            config.patterns.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parses and validates a filter configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: FilterConfig =
            serde_yml::from_str(text).context("Failed to parse filter config")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every extra pattern and the limit overrides, reporting all
    /// problems at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        for (i, pattern) in self.patterns.iter().enumerate() {
            if let Err(e) = patterns::validate_pattern(pattern) {
                errors.push(format!("Pattern #{} ('{}'): {}", i, pattern, e));
            }
        }
        if self.limits.chunk_size == Some(0) {
            errors.push("`limits.chunk_size` must be greater than zero.".to_string());
        }
        if matches!(self.limits.max_concurrent_workers, Some(n) if n < 0) {
            errors.push("`limits.max_concurrent_workers` must not be negative.".to_string());
        }

        if errors.is_empty() {
            debug!("Filter config validated with {} extra patterns.", self.patterns.len());
            Ok(())
        } else {
            Err(anyhow!("Filter config validation failed:\n{}", errors.join("\n")))
        }
    }

    /// Builds a filter from this configuration.
    pub fn build(&self) -> Result<SensitiveDataFilter> {
        let base = SensitiveDataFilter::with_tier(self.tier);
        let limits = self.limits.apply(base.limits());
        let filter = base.with_limits(limits);
        if !self.patterns.is_empty() {
            filter
                .add_patterns(&self.patterns)
                .context("Failed to register configured patterns")?;
        }
        if !self.enabled {
            filter.disable();
        }
        Ok(filter)
    }
}
