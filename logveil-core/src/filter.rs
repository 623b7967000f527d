//! filter.rs - The `SensitiveDataFilter` facade.
//!
//! A filter owns a copy-on-write pattern set, an enabled flag and a worker
//! gate. Reads take a snapshot of the current `Arc<PatternSet>` and release
//! the lock immediately, so a long `filter` call never holds up
//! `add_pattern`, and `pattern_count` never waits on a scan in progress.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::RwLock;

use crate::config::{RedactionLimits, EMPTY_FILTER_TIMEOUT, REDACTED};
use crate::engine::{self, WorkerGate};
use crate::errors::FilterError;
use crate::patterns::{self, keys, Pattern, PatternSet, PresetTier};
use crate::value::Value;
use crate::walker::Walker;

pub struct SensitiveDataFilter {
    patterns: RwLock<Arc<PatternSet>>,
    enabled: AtomicBool,
    gate: WorkerGate,
    limits: RedactionLimits,
    next_custom_id: AtomicUsize,
}

impl SensitiveDataFilter {
    /// A filter with the full built-in pattern set.
    pub fn new() -> Self {
        Self::with_tier(PresetTier::Full)
    }

    /// A filter with the basic built-in pattern set.
    pub fn basic() -> Self {
        Self::with_tier(PresetTier::Basic)
    }

    /// A filter with no patterns. Key-based redaction still applies to
    /// structured values.
    pub fn empty() -> Self {
        Self::from_parts(
            patterns::preset(PresetTier::None),
            RedactionLimits::default().with_timeout(EMPTY_FILTER_TIMEOUT),
        )
    }

    /// A filter with only the given patterns. Fails without side effects if
    /// any pattern is rejected.
    pub fn custom<S: AsRef<str>>(sources: &[S]) -> Result<Self, FilterError> {
        let filter = Self::from_parts(patterns::preset(PresetTier::None), RedactionLimits::default());
        filter.add_patterns(sources)?;
        Ok(filter)
    }

    pub fn with_tier(tier: PresetTier) -> Self {
        let limits = match tier {
            PresetTier::None => RedactionLimits::default().with_timeout(EMPTY_FILTER_TIMEOUT),
            PresetTier::Basic | PresetTier::Full => RedactionLimits::default(),
        };
        Self::from_parts(patterns::preset(tier), limits)
    }

    fn from_parts(set: Arc<PatternSet>, limits: RedactionLimits) -> Self {
        Self {
            patterns: RwLock::new(set),
            enabled: AtomicBool::new(true),
            gate: WorkerGate::new(limits.max_concurrent_workers),
            limits,
            next_custom_id: AtomicUsize::new(0),
        }
    }

    /// Replaces the redaction limits. The worker gate is rebuilt, so this is
    /// meant for construction time.
    pub fn with_limits(mut self, limits: RedactionLimits) -> Self {
        self.gate = WorkerGate::new(limits.max_concurrent_workers);
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> RedactionLimits {
        self.limits
    }

    /// The pattern set in effect right now. Later mutations do not affect it.
    pub fn snapshot(&self) -> Arc<PatternSet> {
        Arc::clone(&self.patterns.read())
    }

    /// Redacts `text`, borrowing it back when nothing matched.
    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !self.is_enabled() || text.is_empty() {
            return Cow::Borrowed(text);
        }
        let set = self.snapshot();
        engine::redact(text, &set, &self.limits, &self.gate)
    }

    /// Redacts `text`. Idempotent, and the identity when disabled.
    pub fn filter(&self, text: &str) -> String {
        self.redact(text).into_owned()
    }

    /// Single-level decision for one field: the key heuristic, then text
    /// redaction for strings. Composite values are returned as given.
    pub fn filter_field_value(&self, key: &str, value: &Value) -> Value {
        if !self.is_enabled() || value.is_null() {
            return value.clone();
        }
        if keys::is_sensitive_key(key) {
            return Value::String(REDACTED.to_string());
        }
        match value {
            Value::String(s) => Value::String(self.filter(s)),
            other => other.clone(),
        }
    }

    /// Filters `value` and everything reachable from it.
    ///
    /// The result never contains shared nodes. Re-entering a node already on
    /// the current path yields `[CIRCULAR_REFERENCE]`; nesting past the depth
    /// limit yields `[MAX_DEPTH_EXCEEDED]`.
    pub fn filter_value_recursive(&self, key: &str, value: &Value) -> Value {
        if !self.is_enabled() {
            return value.clone();
        }
        let set = self.snapshot();
        let mut walker = Walker::new(|s: &str| {
            engine::redact(s, &set, &self.limits, &self.gate).into_owned()
        });
        walker.walk(key, value)
    }

    /// Validates and appends one pattern.
    pub fn add_pattern(&self, source: &str) -> Result<(), FilterError> {
        let pattern = self.compile(source)?;
        self.publish(vec![pattern]);
        Ok(())
    }

    /// Validates every pattern first and appends them in one swap. If any is
    /// rejected, nothing is added.
    pub fn add_patterns<S: AsRef<str>>(&self, sources: &[S]) -> Result<(), FilterError> {
        let mut compiled = Vec::with_capacity(sources.len());
        for (index, source) in sources.iter().enumerate() {
            let pattern = self.compile(source.as_ref()).map_err(|e| FilterError::Batch {
                index,
                source: Box::new(e),
            })?;
            compiled.push(pattern);
        }
        if !compiled.is_empty() {
            self.publish(compiled);
        }
        Ok(())
    }

    /// Drops every pattern, built-in ones included.
    pub fn clear_patterns(&self) {
        *self.patterns.write() = patterns::preset(PresetTier::None);
        debug!(target: "logveil_core::filter", "Cleared all patterns.");
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.read().len()
    }

    pub fn pattern_names(&self) -> Vec<String> {
        self.snapshot().names()
    }

    /// Runs the acceptance checks of `add_pattern` without registering.
    pub fn validate_pattern(&self, source: &str) -> Result<(), FilterError> {
        patterns::validate_pattern(source)
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Redaction workers currently running for this filter.
    pub fn active_worker_count(&self) -> i32 {
        self.gate.active()
    }

    /// Waits up to `timeout` for in-flight workers to finish. Returns true
    /// when none are left.
    pub fn wait_for_workers(&self, timeout: Duration) -> bool {
        self.gate.wait_idle(timeout)
    }

    /// Whether values stored under `key` are always redacted.
    pub fn has_sensitive_key(&self, key: &str) -> bool {
        keys::is_sensitive_key(key)
    }

    fn compile(&self, source: &str) -> Result<Pattern, FilterError> {
        let id = self.next_custom_id.fetch_add(1, Ordering::Relaxed);
        patterns::compile_user_pattern(&format!("custom_{}", id), source)
    }

    fn publish(&self, extra: Vec<Pattern>) {
        let added = extra.len();
        let mut guard = self.patterns.write();
        let grown = Arc::new(guard.extended(extra));
        *guard = grown;
        debug!(
            target: "logveil_core::filter",
            "Added {} pattern(s); {} now active.",
            added,
            guard.len()
        );
    }
}

impl Default for SensitiveDataFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SensitiveDataFilter {
    /// Shares the compiled pattern set. The clone gets its own flag, worker
    /// counter and lock, so later mutations on either side stay local.
    fn clone(&self) -> Self {
        Self {
            patterns: RwLock::new(self.snapshot()),
            enabled: AtomicBool::new(self.is_enabled()),
            gate: WorkerGate::new(self.limits.max_concurrent_workers),
            limits: self.limits,
            next_custom_id: AtomicUsize::new(self.next_custom_id.load(Ordering::Relaxed)),
        }
    }
}

impl fmt::Debug for SensitiveDataFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensitiveDataFilter")
            .field("patterns", &self.pattern_count())
            .field("enabled", &self.is_enabled())
            .field("active_workers", &self.active_worker_count())
            .field("limits", &self.limits)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_passthrough_then_pattern() {
        let filter = SensitiveDataFilter::empty();
        assert_eq!(filter.filter("password=hunter2"), "password=hunter2");
        filter.add_pattern("password=(\\w+)").unwrap();
        assert_eq!(filter.filter("password=hunter2"), "password=[REDACTED]");
        assert_eq!(filter.limits().timeout, EMPTY_FILTER_TIMEOUT);
    }

    #[test]
    fn test_redact_borrows_when_unchanged() {
        let filter = SensitiveDataFilter::new();
        assert!(matches!(filter.redact("nothing to see"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_clone_is_copy_on_write() {
        let original = SensitiveDataFilter::basic();
        let copy = original.clone();
        assert!(Arc::ptr_eq(&original.snapshot(), &copy.snapshot()));

        copy.add_pattern("internal-\\d+").unwrap();
        assert_eq!(copy.pattern_count(), original.pattern_count() + 1);

        copy.disable();
        assert!(original.is_enabled());
    }

    #[test]
    fn test_batch_rejection_names_index() {
        let filter = SensitiveDataFilter::empty();
        let err = filter.add_patterns(&["ok\\d", "(a+)+b"]).unwrap_err();
        assert!(matches!(err, FilterError::Batch { index: 1, .. }));
        assert!(err.is_redos());
        assert_eq!(filter.pattern_count(), 0);
    }

    #[test]
    fn test_custom_constructor() {
        let filter = SensitiveDataFilter::custom(&["ticket-\\d{4}"]).unwrap();
        assert_eq!(filter.pattern_count(), 1);
        assert_eq!(filter.filter("see ticket-1234"), "see [REDACTED]");
        assert!(SensitiveDataFilter::custom(&[""]).is_err());
    }

    #[test]
    fn test_field_value_single_level() {
        let filter = SensitiveDataFilter::new();
        assert_eq!(filter.filter_field_value("token", &Value::from(7)), Value::from(REDACTED));
        assert_eq!(filter.filter_field_value("count", &Value::from(7)), Value::from(7));
        assert_eq!(filter.filter_field_value("token", &Value::Null), Value::Null);
    }
}
