//! patterns - Compilation and sharing of sensitive-data detectors.
//!
//! A `PatternSet` is an immutable, ordered list of compiled `Pattern`s. Filters
//! hold it behind an `Arc` so clones share the compiled regexes; mutation always
//! builds a new set and swaps the pointer.
//!
//! The two built-in tiers are compiled once per process and cached in
//! `lazy_static` statics, the same way compiled rule sets are cached globally.
//!
//! License: MIT OR APACHE 2.0

pub mod keys;
pub mod presets;
pub mod safety;

use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::config::MAX_PATTERN_LENGTH;
use crate::errors::FilterError;
use presets::PresetDef;

/// Compiled-program ceiling handed to the regex builder.
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Selects which built-in pattern set a filter starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetTier {
    /// No built-in patterns.
    None,
    /// Credentials, card numbers, phone numbers and database DSNs.
    Basic,
    /// Everything in `Basic` plus tokens, cloud keys and IPv4 addresses.
    #[default]
    Full,
}

impl fmt::Display for PresetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PresetTier::None => "none",
            PresetTier::Basic => "basic",
            PresetTier::Full => "full",
        };
        f.write_str(name)
    }
}

/// How much trust a pattern was admitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSafety {
    /// Shipped with the library and reviewed by hand.
    Vetted,
    /// Supplied at runtime and passed the backtracking-hazard scan.
    Validated,
}

/// A single compiled detector.
///
/// When the regex has a capture group, only group 1 is treated as the secret and
/// everything else in the match (e.g. `password=`) survives redaction.
#[derive(Debug, Clone)]
pub struct Pattern {
    name: String,
    regex: Regex,
    safety: PatternSafety,
    validator: Option<fn(&str) -> bool>,
}

impl Pattern {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pattern's source text.
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn safety(&self) -> PatternSafety {
        self.safety
    }

    /// Whether a matched candidate should be kept after programmatic validation.
    pub fn accepts(&self, candidate: &str) -> bool {
        self.validator.map_or(true, |validate| validate(candidate))
    }

    /// True when the regex isolates its secret in capture group 1.
    pub fn has_secret_group(&self) -> bool {
        self.regex.captures_len() > 1
    }
}

/// An immutable, ordered collection of compiled patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pattern> {
        self.patterns.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.patterns.iter().map(|p| p.name.clone()).collect()
    }

    /// Builds a new set holding this set's patterns followed by `extra`.
    ///
    /// `Regex` clones share their compiled program, so this never recompiles.
    pub fn extended(&self, extra: Vec<Pattern>) -> PatternSet {
        let mut patterns = Vec::with_capacity(self.patterns.len() + extra.len());
        patterns.extend(self.patterns.iter().cloned());
        patterns.extend(extra);
        PatternSet { patterns }
    }
}

impl<'a> IntoIterator for &'a PatternSet {
    type Item = &'a Pattern;
    type IntoIter = std::slice::Iter<'a, Pattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.patterns.iter()
    }
}

fn build_regex(source: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
}

/// Validates a user-supplied pattern without compiling it into a registry.
///
/// Checks run cheapest first: emptiness, length, the backtracking-hazard scan,
/// and finally compilation.
pub fn validate_pattern(source: &str) -> Result<(), FilterError> {
    compile_user_pattern("validation", source).map(|_| ())
}

/// Validates and compiles a user-supplied pattern.
pub fn compile_user_pattern(name: &str, source: &str) -> Result<Pattern, FilterError> {
    if source.is_empty() {
        return Err(FilterError::EmptyPattern);
    }
    if source.len() > MAX_PATTERN_LENGTH {
        return Err(FilterError::PatternTooLong(source.len(), MAX_PATTERN_LENGTH));
    }
    safety::check_backtracking_hazards(source)?;

    let regex = build_regex(source)
        .map_err(|e| FilterError::InvalidPattern(source.to_string(), e))?;

    debug!(
        target: "logveil_core::patterns",
        "Pattern '{}' compiled successfully.",
        name
    );
    Ok(Pattern {
        name: name.to_string(),
        regex,
        safety: PatternSafety::Validated,
        validator: None,
    })
}

fn compile_presets(defs: &[&[PresetDef]]) -> PatternSet {
    let mut patterns = Vec::new();
    for def in defs.iter().flat_map(|group| group.iter()) {
        match build_regex(def.pattern) {
            Ok(regex) => patterns.push(Pattern {
                name: def.name.to_string(),
                regex,
                safety: PatternSafety::Vetted,
                validator: def.validator,
            }),
            Err(e) => {
                warn!("Skipping built-in pattern '{}': {}", def.name, e);
            }
        }
    }
    debug!("Compiled {} built-in patterns.", patterns.len());
    PatternSet::new(patterns)
}

lazy_static! {
    static ref EMPTY_SET: Arc<PatternSet> = Arc::new(PatternSet::default());
    static ref BASIC_SET: Arc<PatternSet> = Arc::new(compile_presets(&[presets::BASIC]));
    static ref FULL_SET: Arc<PatternSet> =
        Arc::new(compile_presets(&[presets::BASIC, presets::FULL_EXTRA]));
}

/// Returns the shared, compiled pattern set for `tier`.
pub fn preset(tier: PresetTier) -> Arc<PatternSet> {
    match tier {
        PresetTier::None => Arc::clone(&EMPTY_SET),
        PresetTier::Basic => Arc::clone(&BASIC_SET),
        PresetTier::Full => Arc::clone(&FULL_SET),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_compile_completely() {
        assert_eq!(preset(PresetTier::Basic).len(), presets::BASIC.len());
        assert_eq!(
            preset(PresetTier::Full).len(),
            presets::BASIC.len() + presets::FULL_EXTRA.len()
        );
        assert!(preset(PresetTier::None).is_empty());
    }

    #[test]
    fn test_tier_sizes() {
        assert!(preset(PresetTier::Basic).len() >= 16);
        assert!(preset(PresetTier::Full).len() >= 20);
    }

    #[test]
    fn test_preset_sets_are_shared() {
        let a = preset(PresetTier::Full);
        let b = preset(PresetTier::Full);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_extended_keeps_original() {
        let base = preset(PresetTier::Basic);
        let extra = compile_user_pattern("custom_0", "foo+").unwrap();
        let grown = base.extended(vec![extra]);
        assert_eq!(grown.len(), base.len() + 1);
        assert_eq!(base.len(), presets::BASIC.len());
    }

    #[test]
    fn test_compile_user_pattern_rejections() {
        assert!(matches!(compile_user_pattern("x", ""), Err(FilterError::EmptyPattern)));
        let long = "a".repeat(MAX_PATTERN_LENGTH + 1);
        assert!(matches!(
            compile_user_pattern("x", &long),
            Err(FilterError::PatternTooLong(_, MAX_PATTERN_LENGTH))
        ));
        assert!(matches!(
            compile_user_pattern("x", "[invalid("),
            Err(FilterError::InvalidPattern(_, _))
        ));
        assert!(compile_user_pattern("x", "(a+)+b").unwrap_err().is_redos());
    }

    #[test]
    fn test_secret_group_detection() {
        let grouped = compile_user_pattern("g", "(?i)token=(\\w+)").unwrap();
        let plain = compile_user_pattern("p", "token=\\w+").unwrap();
        assert!(grouped.has_secret_group());
        assert!(!plain.has_secret_group());
        assert_eq!(plain.safety(), PatternSafety::Validated);
    }
}
