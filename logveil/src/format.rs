//! Entry formatting.
//!
//! A `Formatter` turns one fully redacted `Entry` into one line (without the
//! trailing newline). Two implementations ship with the crate: a human
//! readable `TextFormatter` and a one-object-per-line `JsonFormatter`.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;
use std::fmt::Write as _;
use std::panic::Location;

use chrono::{DateTime, SecondsFormat, Utc};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::field::Field;
use crate::level::Level;
use crate::security;

/// Source location of a logging call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub file: Cow<'static, str>,
    pub line: u32,
}

impl Caller {
    /// File name without its directories.
    pub fn short_file(&self) -> &str {
        self.file.rsplit(['/', '\\']).next().unwrap_or(self.file.as_ref())
    }
}

impl From<&'static Location<'static>> for Caller {
    fn from(location: &'static Location<'static>) -> Self {
        Caller {
            file: Cow::Borrowed(location.file()),
            line: location.line(),
        }
    }
}

/// Everything a formatter sees. Message and fields are already redacted.
#[derive(Debug)]
pub struct Entry<'a> {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub caller: Option<&'a Caller>,
    pub message: &'a str,
    pub fields: &'a [Field],
}

pub trait Formatter: Send + Sync {
    fn format(&self, entry: &Entry<'_>) -> String;
}

/// Output format selector used by configuration and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    #[default]
    Text,
    Json,
}

impl FormatKind {
    pub fn build(self, color: bool) -> Box<dyn Formatter> {
        match self {
            FormatKind::Text => Box::new(TextFormatter::new().with_color(color)),
            FormatKind::Json => Box::new(JsonFormatter::new()),
        }
    }
}

fn timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `2026-01-02T03:04:05.678Z INFO  main.rs:12 message key=value`
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    color: bool,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn write_level(&self, out: &mut String, level: Level) {
        let label = format!("{:<5}", level);
        if !self.color {
            out.push_str(&label);
            return;
        }
        let _ = match level {
            Level::Debug => write!(out, "{}", label.dimmed()),
            Level::Info => write!(out, "{}", label.green()),
            Level::Warn => write!(out, "{}", label.yellow()),
            Level::Error => write!(out, "{}", label.red()),
            Level::Fatal => write!(out, "{}", label.bright_red().bold()),
        };
    }
}

/// Strips control characters, then quotes values that would otherwise be
/// ambiguous in `key=value` form.
fn text_value(value: &logveil_core::Value) -> String {
    let rendered = value.to_string();
    let rendered = security::sanitize_control_chars(&rendered);
    let needs_quotes = rendered.is_empty()
        || rendered
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '=');
    if needs_quotes && value.as_str().is_some() {
        format!("{:?}", rendered)
    } else {
        rendered.into_owned()
    }
}

impl Formatter for TextFormatter {
    fn format(&self, entry: &Entry<'_>) -> String {
        let mut out = String::with_capacity(64 + entry.message.len());
        out.push_str(&timestamp(&entry.time));
        out.push(' ');
        self.write_level(&mut out, entry.level);
        if let Some(caller) = entry.caller {
            let _ = write!(out, " {}:{}", caller.short_file(), caller.line);
        }
        out.push(' ');
        out.push_str(entry.message);
        for field in entry.fields {
            let _ = write!(
                out,
                " {}={}",
                security::sanitize_control_chars(&field.key),
                text_value(&field.value)
            );
        }
        out
    }
}

/// `{"time":"...","level":"info","caller":"main.rs:12","msg":"...",...fields}`
///
/// A field whose key collides with one of the fixed keys is emitted as
/// `fields.<key>`.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        JsonFormatter
    }
}

const RESERVED_KEYS: [&str; 4] = ["time", "level", "caller", "msg"];

impl Formatter for JsonFormatter {
    fn format(&self, entry: &Entry<'_>) -> String {
        let mut obj = Map::new();
        obj.insert("time".into(), Json::String(timestamp(&entry.time)));
        obj.insert("level".into(), Json::String(entry.level.as_str().to_ascii_lowercase()));
        if let Some(caller) = entry.caller {
            obj.insert(
                "caller".into(),
                Json::String(format!("{}:{}", caller.short_file(), caller.line)),
            );
        }
        obj.insert("msg".into(), Json::String(entry.message.to_string()));
        for field in entry.fields {
            let key = if RESERVED_KEYS.contains(&field.key.as_str()) {
                format!("fields.{}", field.key)
            } else {
                field.key.clone()
            };
            obj.insert(key, field.value.to_json());
        }
        Json::Object(obj).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry<'a>(caller: Option<&'a Caller>, fields: &'a [Field]) -> Entry<'a> {
        Entry {
            time: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            level: Level::Info,
            caller,
            message: "user logged in",
            fields,
        }
    }

    #[test]
    fn test_text_layout() {
        let caller = Caller {
            file: Cow::Borrowed("src/auth/login.rs"),
            line: 12,
        };
        let fields = [Field::new("user", "ana"), Field::new("note", "two words")];
        let line = TextFormatter::new().format(&entry(Some(&caller), &fields));
        assert_eq!(
            line,
            "2026-01-02T03:04:05.000Z INFO  login.rs:12 user logged in user=ana note=\"two words\""
        );
    }

    #[test]
    fn test_text_fields_drop_control_characters() {
        let fields = [Field::new("no\u{7}te", "a\u{1b}[2Jb\u{0}c"), Field::new("tab", "x\ty")];
        let line = TextFormatter::new().format(&entry(None, &fields));
        assert!(line.ends_with(" user logged in note=abc tab=\"x\\ty\""), "got {:?}", line);
    }

    #[test]
    fn test_json_layout() {
        let fields = [Field::new("msg", "shadow"), Field::new("attempt", 2)];
        let line = JsonFormatter::new().format(&entry(None, &fields));
        let parsed: Json = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["msg"], "user logged in");
        assert_eq!(parsed["fields.msg"], "shadow");
        assert_eq!(parsed["attempt"], 2);
        assert!(parsed.get("caller").is_none());
    }

    #[test]
    fn test_colored_level_contains_label() {
        let line = TextFormatter::new().with_color(true).format(&entry(None, &[]));
        assert!(line.contains("INFO"));
        assert!(line.contains('\u{1b}'));
    }
}
