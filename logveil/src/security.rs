//! Security settings applied on the logging hot path.
//!
//! The sensitive-data filter redacts; this module adds the two guards that sit
//! around it: stripping terminal control sequences from messages, and capping
//! the size of a formatted entry.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;
use std::sync::Arc;

use logveil_core::{SensitiveDataFilter, Value};

use crate::field::Field;

/// Default cap on a formatted entry (5 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 5 * 1024 * 1024;

/// Default number of writers a logger accepts.
pub const DEFAULT_MAX_WRITERS: usize = 100;

/// Appended to an entry cut by the size cap.
pub const SIZE_CAP_MARKER: &str = "...";

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub max_message_size: usize,
    pub max_writers: usize,
    /// `None` turns redaction off entirely.
    pub sensitive_filter: Option<Arc<SensitiveDataFilter>>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_writers: DEFAULT_MAX_WRITERS,
            sensitive_filter: Some(Arc::new(SensitiveDataFilter::basic())),
        }
    }
}

impl SecurityConfig {
    /// Limits only, no redaction.
    pub fn without_filter() -> Self {
        Self {
            sensitive_filter: None,
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: SensitiveDataFilter) -> Self {
        self.sensitive_filter = Some(Arc::new(filter));
        self
    }

    /// The filter, if one is configured and currently enabled.
    pub fn active_filter(&self) -> Option<&SensitiveDataFilter> {
        self.sensitive_filter.as_deref().filter(|f| f.is_enabled())
    }
}

fn is_forbidden_control(c: char) -> bool {
    (c.is_ascii_control() && !matches!(c, '\n' | '\r' | '\t')) || c == '\u{7f}'
}

/// Removes ANSI escape sequences whole, then any remaining C0 control
/// character other than newline, carriage return and tab, and DEL.
pub fn sanitize_control_chars(message: &str) -> Cow<'_, str> {
    if !message.chars().any(is_forbidden_control) {
        return Cow::Borrowed(message);
    }
    let stripped: Cow<'_, str> = if message.contains('\u{1b}') {
        Cow::Owned(strip_ansi_escapes::strip_str(message))
    } else {
        Cow::Borrowed(message)
    };
    Cow::Owned(stripped.chars().filter(|c| !is_forbidden_control(*c)).collect())
}

/// Cuts `line` to at most `max` bytes at a char boundary and appends the
/// size-cap marker. A `max` of zero disables the cap.
pub fn cap_message_size(mut line: String, max: usize) -> String {
    if max == 0 || line.len() <= max {
        return line;
    }
    let mut cut = max;
    while !line.is_char_boundary(cut) {
        cut -= 1;
    }
    line.truncate(cut);
    line.push_str(SIZE_CAP_MARKER);
    line
}

/// Quick pre-check: can filtering change any of these fields?
///
/// With no patterns, only a sensitive key (at the top level, or possibly
/// nested inside a composite value) can trigger redaction.
pub fn fields_need_filtering(filter: &SensitiveDataFilter, fields: &[Field]) -> bool {
    if fields.is_empty() {
        return false;
    }
    if filter.pattern_count() > 0 {
        return true;
    }
    fields.iter().any(|f| {
        filter.has_sensitive_key(&f.key)
            || matches!(
                f.value,
                Value::Map(_) | Value::Struct(_) | Value::Shared(_) | Value::Array(_)
            )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_controls_keeps_whitespace() {
        assert_eq!(sanitize_control_chars("a\tb\r\nc"), "a\tb\r\nc");
        assert_eq!(sanitize_control_chars("bell\u{7}del\u{7f}nul\u{0}"), "belldelnul");
        assert!(matches!(sanitize_control_chars("clean"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_ansi_sequences_whole() {
        assert_eq!(sanitize_control_chars("\u{1b}[31mred\u{1b}[0m text"), "red text");
        assert_eq!(sanitize_control_chars("fake\u{1b}[2Jclear"), "fakeclear");
    }

    #[test]
    fn test_cap_message_size() {
        assert_eq!(cap_message_size("hello".into(), 10), "hello");
        assert_eq!(cap_message_size("hello world".into(), 5), "hello...");
        assert_eq!(cap_message_size("héllo".into(), 2), "h...");
        assert_eq!(cap_message_size("unbounded".into(), 0), "unbounded");
    }

    #[test]
    fn test_precheck() {
        let empty = SensitiveDataFilter::empty();
        assert!(!fields_need_filtering(&empty, &[Field::new("user", "ana")]));
        assert!(fields_need_filtering(&empty, &[Field::new("password", "x")]));
        assert!(fields_need_filtering(&empty, &[Field::new("req", Value::Map(Default::default()))]));
        assert!(fields_need_filtering(&SensitiveDataFilter::basic(), &[Field::new("user", "ana")]));
    }
}
