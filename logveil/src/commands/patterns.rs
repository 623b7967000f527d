//! `logveil patterns`: lists the built-in detectors of a tier, followed by a
//! count line.
//!
//! License: MIT OR APACHE 2.0

use std::io::{self, Write};

use anyhow::Result;
use logveil_core::patterns::preset;
use logveil_core::PresetTier;

use crate::cli::PatternsCommand;

pub fn list_patterns<W: Write>(tier: PresetTier, show_source: bool, out: &mut W) -> Result<()> {
    let set = preset(tier);
    for pattern in set.iter() {
        if show_source {
            writeln!(out, "{}\t{}", pattern.name(), pattern.source())?;
        } else {
            writeln!(out, "{}", pattern.name())?;
        }
    }
    writeln!(out, "{} patterns ({} tier)", set.len(), tier)?;
    Ok(())
}

pub fn run(cmd: &PatternsCommand) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    list_patterns(cmd.tier.into(), cmd.show_source, &mut writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_lists_more_than_basic() {
        let mut basic = Vec::new();
        let mut full = Vec::new();
        list_patterns(PresetTier::Basic, false, &mut basic).unwrap();
        list_patterns(PresetTier::Full, false, &mut full).unwrap();
        let basic = String::from_utf8(basic).unwrap();
        let full = String::from_utf8(full).unwrap();
        assert!(basic.lines().any(|l| l == "password_assignment"));
        assert!(!basic.lines().any(|l| l == "jwt"));
        assert!(full.lines().any(|l| l == "jwt"));
        assert!(full.lines().count() > basic.lines().count());
        assert!(basic.ends_with("patterns (basic tier)\n"));
    }

    #[test]
    fn test_none_tier_lists_only_count() {
        let mut out = Vec::new();
        list_patterns(PresetTier::None, true, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 patterns (none tier)\n");
    }
}
