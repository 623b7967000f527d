//! `logveil check`: validates custom patterns before they are deployed.
//!
//! License: MIT OR APACHE 2.0

use std::io::{self, Write};

use anyhow::Result;
use is_terminal::IsTerminal;
use log::debug;
use logveil_core::validate_pattern;
use owo_colors::OwoColorize;

use crate::cli::CheckCommand;

/// Reports on every pattern. Returns `true` only if all were accepted.
pub fn check_patterns<W: Write>(patterns: &[String], out: &mut W, color: bool) -> Result<bool> {
    let mut all_ok = true;
    for pattern in patterns {
        match validate_pattern(pattern) {
            Ok(()) => {
                let tag = if color { "ok".green().to_string() } else { "ok".to_string() };
                writeln!(out, "{:>6}  {}", tag, pattern)?;
            }
            Err(e) => {
                all_ok = false;
                debug!("Rejected pattern {:?}: {:?}", pattern, e);
                let tag = if color { "reject".red().to_string() } else { "reject".to_string() };
                writeln!(out, "{:>6}  {}: {}", tag, pattern, e)?;
            }
        }
    }
    Ok(all_ok)
}

pub fn run(cmd: &CheckCommand) -> Result<bool> {
    let stdout = io::stdout();
    let color = stdout.is_terminal();
    let mut writer = stdout.lock();
    check_patterns(&cmd.patterns, &mut writer, color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_each_pattern() {
        let patterns = vec![r"token=(\w+)".to_string(), "(a+)+b".to_string(), String::new()];
        let mut out = Vec::new();
        let ok = check_patterns(&patterns, &mut out, false).unwrap();
        assert!(!ok);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("    ok"));
        assert!(lines[1].contains("ReDoS"));
        assert!(lines[2].contains("pattern is empty"));
    }

    #[test]
    fn test_all_valid() {
        let mut out = Vec::new();
        assert!(check_patterns(&[r"\bid-\d{4}\b".to_string()], &mut out, false).unwrap());
    }
}
