//! `logveil filter`: redacts a stream line by line.
//!
//! License: MIT OR APACHE 2.0

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use logveil_core::{FilterConfig, SensitiveDataFilter};

use crate::cli::FilterCommand;

/// Builds the filter described by the command's flags.
pub fn build_filter(cmd: &FilterCommand) -> Result<SensitiveDataFilter> {
    let filter = match &cmd.config {
        Some(path) => FilterConfig::load_from_file(path)?.build()?,
        None => SensitiveDataFilter::with_tier(cmd.tier.into()),
    };
    let filter = match cmd.timeout_ms {
        Some(ms) => {
            let limits = filter.limits().with_timeout(Duration::from_millis(ms));
            filter.with_limits(limits)
        }
        None => filter,
    };
    if !cmd.patterns.is_empty() {
        filter
            .add_patterns(&cmd.patterns)
            .context("Failed to add custom patterns")?;
    }
    if cmd.disable {
        filter.disable();
    }
    debug!("Filter ready with {} patterns.", filter.pattern_count());
    Ok(filter)
}

/// Redacts every line of `input` into `output`, keeping line endings.
/// Returns the number of lines that changed.
pub fn redact_stream<R: BufRead, W: Write>(filter: &SensitiveDataFilter, mut input: R, output: &mut W) -> Result<usize> {
    let mut line = String::new();
    let mut changed = 0;
    loop {
        line.clear();
        if input.read_line(&mut line).context("Failed to read input")? == 0 {
            break;
        }
        let body = line.trim_end_matches(['\n', '\r']);
        let ending = &line[body.len()..];
        let redacted = filter.redact(body);
        if redacted != body {
            changed += 1;
        }
        output.write_all(redacted.as_bytes())?;
        output.write_all(ending.as_bytes())?;
    }
    output.flush()?;
    Ok(changed)
}

pub fn run(cmd: &FilterCommand) -> Result<()> {
    info!("Starting filter operation.");
    let filter = build_filter(cmd)?;

    let input: Box<dyn BufRead> = match &cmd.input_file {
        Some(path) => {
            let file = fs::File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let changed = match &cmd.output {
        Some(path) => {
            let mut file = fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            redact_stream(&filter, input, &mut file)?
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            redact_stream(&filter, input, &mut writer)?
        }
    };

    info!("Filter operation completed, {} lines redacted.", changed);
    Ok(())
}
