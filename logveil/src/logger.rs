//! The `Logger`: leveled, structured, redacting.
//!
//! Each call runs the same pipeline: level check, message redaction, control
//! character sanitation, field redaction, formatting, size cap, fan-out to the
//! writers. Redaction happens on the raw message before any timestamp or
//! caller scaffolding exists, so markers never land inside the scaffolding.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};
use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::field::Field;
use crate::format::{Caller, Entry, Formatter, TextFormatter};
use crate::level::Level;
use crate::security::{self, SecurityConfig};
use crate::writer::BoxedWriter;

/// How long `close` waits for in-flight redaction workers.
pub const CLOSE_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Called after a fatal entry has been written and flushed.
pub type FatalHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoggerError {
    #[error("writer limit reached ({max} writers)")]
    TooManyWriters { max: usize },

    #[error("logger is closed")]
    Closed,

    #[error("I/O error while writing log output: {0}")]
    Io(#[from] io::Error),
}

/// Construction options for `Logger::new`.
pub struct LoggerOptions {
    pub level: Level,
    pub formatter: Box<dyn Formatter>,
    pub writers: Vec<BoxedWriter>,
    pub security: SecurityConfig,
    pub fatal_hook: Option<FatalHook>,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: Level::Info,
            formatter: Box::new(TextFormatter::new()),
            writers: vec![Box::new(io::stderr())],
            security: SecurityConfig::default(),
            fatal_hook: None,
        }
    }
}

/// Fluent construction of a `Logger`. Starts with no writers.
pub struct LoggerBuilder {
    options: LoggerOptions,
}

impl LoggerBuilder {
    pub fn level(mut self, level: Level) -> Self {
        self.options.level = level;
        self
    }

    pub fn formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.options.formatter = Box::new(formatter);
        self
    }

    pub fn boxed_formatter(mut self, formatter: Box<dyn Formatter>) -> Self {
        self.options.formatter = formatter;
        self
    }

    pub fn writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.options.writers.push(Box::new(writer));
        self
    }

    pub fn boxed_writer(mut self, writer: BoxedWriter) -> Self {
        self.options.writers.push(writer);
        self
    }

    pub fn security(mut self, security: SecurityConfig) -> Self {
        self.options.security = security;
        self
    }

    pub fn fatal_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.options.fatal_hook = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<Logger, LoggerError> {
        Logger::new(self.options)
    }
}

struct Shared {
    level: AtomicU8,
    formatter: Box<dyn Formatter>,
    writers: Mutex<Vec<BoxedWriter>>,
    security: RwLock<SecurityConfig>,
    fatal_hook: FatalHook,
    closed: AtomicBool,
}

/// Cheap to clone; clones and children created by `with_fields` share level,
/// writers and security settings.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    fields: Arc<[Field]>,
}

fn exit_on_fatal() -> FatalHook {
    Arc::new(|| std::process::exit(1))
}

impl Logger {
    pub fn new(options: LoggerOptions) -> Result<Self, LoggerError> {
        let max = options.security.max_writers;
        if options.writers.len() > max {
            return Err(LoggerError::TooManyWriters { max });
        }
        Ok(Self {
            shared: Arc::new(Shared {
                level: AtomicU8::new(options.level as u8),
                formatter: options.formatter,
                writers: Mutex::new(options.writers),
                security: RwLock::new(options.security),
                fatal_hook: options.fatal_hook.unwrap_or_else(exit_on_fatal),
                closed: AtomicBool::new(false),
            }),
            fields: Arc::from(Vec::new()),
        })
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder {
            options: LoggerOptions {
                writers: Vec::new(),
                ..LoggerOptions::default()
            },
        }
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.shared.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: Level) {
        self.shared.level.store(level as u8, Ordering::Relaxed);
    }

    pub fn is_enabled_for(&self, level: Level) -> bool {
        level >= self.level() && !self.shared.closed.load(Ordering::Acquire)
    }

    pub fn security_config(&self) -> SecurityConfig {
        self.shared.security.read().clone()
    }

    /// Replaces the security settings for every logger sharing this one's
    /// output. Existing writers are kept even if they exceed a lower limit.
    pub fn set_security_config(&self, config: SecurityConfig) {
        *self.shared.security.write() = config;
    }

    pub fn add_writer(&self, writer: impl Write + Send + 'static) -> Result<(), LoggerError> {
        self.add_boxed_writer(Box::new(writer))
    }

    pub fn add_boxed_writer(&self, writer: BoxedWriter) -> Result<(), LoggerError> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(LoggerError::Closed);
        }
        let max = self.shared.security.read().max_writers;
        let mut writers = self.shared.writers.lock();
        if writers.len() >= max {
            return Err(LoggerError::TooManyWriters { max });
        }
        writers.push(writer);
        Ok(())
    }

    pub fn writer_count(&self) -> usize {
        self.shared.writers.lock().len()
    }

    /// A child logger that adds `fields` to every entry it writes.
    pub fn with_fields<I>(&self, fields: I) -> Logger
    where
        I: IntoIterator<Item = Field>,
    {
        let merged: Vec<Field> = self.fields.iter().cloned().chain(fields).collect();
        Logger {
            shared: Arc::clone(&self.shared),
            fields: Arc::from(merged),
        }
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: &str) {
        self.dispatch(level, message, &[], Some(Caller::from(Location::caller())));
    }

    #[track_caller]
    pub fn log_with_fields(&self, level: Level, message: &str, fields: &[Field]) {
        self.dispatch(level, message, fields, Some(Caller::from(Location::caller())));
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    #[track_caller]
    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    #[track_caller]
    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    #[track_caller]
    pub fn debug_with(&self, message: &str, fields: &[Field]) {
        self.log_with_fields(Level::Debug, message, fields);
    }

    #[track_caller]
    pub fn info_with(&self, message: &str, fields: &[Field]) {
        self.log_with_fields(Level::Info, message, fields);
    }

    #[track_caller]
    pub fn warn_with(&self, message: &str, fields: &[Field]) {
        self.log_with_fields(Level::Warn, message, fields);
    }

    #[track_caller]
    pub fn error_with(&self, message: &str, fields: &[Field]) {
        self.log_with_fields(Level::Error, message, fields);
    }

    /// Writes a fatal entry, flushes, then runs the fatal hook (by default
    /// the process exits with status 1).
    #[track_caller]
    pub fn fatal(&self, message: &str) {
        self.fatal_with(message, &[]);
    }

    #[track_caller]
    pub fn fatal_with(&self, message: &str, fields: &[Field]) {
        self.dispatch(Level::Fatal, message, fields, Some(Caller::from(Location::caller())));
        let _ = self.flush();
        (self.shared.fatal_hook)();
    }

    pub fn flush(&self) -> Result<(), LoggerError> {
        let mut writers = self.shared.writers.lock();
        let mut first_error = None;
        for writer in writers.iter_mut() {
            if let Err(e) = writer.flush() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(LoggerError::Io(e)),
            None => Ok(()),
        }
    }

    /// Flushes, stops accepting entries, and waits briefly for the filter's
    /// redaction workers to drain. Returns whether they did.
    pub fn close(&self) -> Result<bool, LoggerError> {
        let flushed = self.flush();
        self.shared.closed.store(true, Ordering::Release);
        let drained = match &self.shared.security.read().sensitive_filter {
            Some(filter) => filter.wait_for_workers(CLOSE_DRAIN_TIMEOUT),
            None => true,
        };
        flushed.map(|_| drained)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// The hot path shared by every public entry point.
    pub(crate) fn dispatch(&self, level: Level, message: &str, fields: &[Field], caller: Option<Caller>) {
        if !self.is_enabled_for(level) {
            return;
        }
        let security = self.security_config();
        let filter = security.active_filter();

        let message = match filter {
            Some(f) => f.redact(message),
            None => Cow::Borrowed(message),
        };
        let message = security::sanitize_control_chars(&message);

        let all_fields: Cow<'_, [Field]> = if self.fields.is_empty() {
            Cow::Borrowed(fields)
        } else {
            Cow::Owned(self.fields.iter().chain(fields).cloned().collect())
        };
        let fields: Cow<'_, [Field]> = match filter {
            Some(f) if security::fields_need_filtering(f, &all_fields) => Cow::Owned(
                all_fields
                    .iter()
                    .map(|field| Field {
                        key: field.key.clone(),
                        value: f.filter_value_recursive(&field.key, &field.value),
                    })
                    .collect(),
            ),
            _ => all_fields,
        };

        let entry = Entry {
            time: Utc::now(),
            level,
            caller: caller.as_ref(),
            message: &message,
            fields: &fields,
        };
        let mut line = security::cap_message_size(self.shared.formatter.format(&entry), security.max_message_size);
        line.push('\n');

        let mut writers = self.shared.writers.lock();
        for writer in writers.iter_mut() {
            if let Err(e) = writer.write_all(line.as_bytes()) {
                // The logger cannot log its own failure.
                eprintln!("logveil: failed to write log entry: {}", e);
            }
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("writers", &self.writer_count())
            .field("fields", &self.fields.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::MemoryWriter;

    fn capture(level: Level) -> (Logger, MemoryWriter) {
        let sink = MemoryWriter::new();
        let logger = Logger::builder()
            .level(level)
            .writer(sink.clone())
            .build()
            .unwrap();
        (logger, sink)
    }

    #[test]
    fn test_level_gate() {
        let (logger, sink) = capture(Level::Warn);
        logger.info("hidden");
        logger.warn("shown");
        assert_eq!(sink.lines().len(), 1);
        assert!(sink.contents().contains("shown"));
    }

    #[test]
    fn test_caller_is_this_file() {
        let (logger, sink) = capture(Level::Debug);
        logger.debug("where");
        assert!(sink.contents().contains("logger.rs:"));
    }

    #[test]
    fn test_too_many_writers() {
        let logger = Logger::builder()
            .security(SecurityConfig {
                max_writers: 1,
                ..SecurityConfig::default()
            })
            .writer(MemoryWriter::new())
            .build()
            .unwrap();
        let err = logger.add_writer(MemoryWriter::new()).unwrap_err();
        assert!(matches!(err, LoggerError::TooManyWriters { max: 1 }));
    }

    #[test]
    fn test_closed_logger_drops_entries() {
        let (logger, sink) = capture(Level::Info);
        assert!(logger.close().unwrap());
        logger.info("late");
        assert!(sink.contents().is_empty());
        assert!(matches!(logger.add_writer(MemoryWriter::new()), Err(LoggerError::Closed)));
    }
}
