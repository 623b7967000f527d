//! `log` facade backend.
//!
//! Installing a `Logger` routes every `log::info!` and friends through the same
//! redaction pipeline as direct calls. Records emitted by logveil itself are
//! dropped, since they can be produced while an entry is being redacted.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;

use log::{LevelFilter, Metadata, Record, SetLoggerError};

use crate::field::Field;
use crate::format::Caller;
use crate::level::Level;
use crate::logger::Logger;

fn is_internal(target: &str) -> bool {
    target == "logveil"
        || target.starts_with("logveil::")
        || target == "logveil_core"
        || target.starts_with("logveil_core::")
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        !is_internal(metadata.target()) && self.is_enabled_for(Level::from(metadata.level()))
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let caller = record
            .file_static()
            .map(Cow::Borrowed)
            .or_else(|| record.file().map(|f| Cow::Owned(f.to_string())))
            .map(|file| Caller {
                file,
                line: record.line().unwrap_or(0),
            });
        let message = record.args().to_string();
        let fields = [Field::new("target", record.target())];
        self.dispatch(Level::from(record.level()), &message, &fields, caller);
    }

    fn flush(&self) {
        let _ = Logger::flush(self);
    }
}

impl Logger {
    /// Installs a clone of this logger as the global `log` backend.
    ///
    /// Can only succeed once per process.
    pub fn install(&self) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(self.clone()))?;
        log::set_max_level(LevelFilter::Trace);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::MemoryWriter;
    use log::Log;

    #[test]
    fn test_records_flow_through_filter() {
        let sink = MemoryWriter::new();
        let logger = Logger::builder().writer(sink.clone()).build().unwrap();
        Log::log(
            &logger,
            &Record::builder()
                .args(format_args!("connecting with password=hunter2"))
                .level(log::Level::Warn)
                .target("app::db")
                .file_static(Some("src/db.rs"))
                .line(Some(7))
                .build(),
        );
        let out = sink.contents();
        assert!(out.contains("password=[REDACTED]"));
        assert!(out.contains("db.rs:7"));
        assert!(out.contains("target=app::db"));
    }

    #[test]
    fn test_internal_targets_ignored() {
        let sink = MemoryWriter::new();
        let logger = Logger::builder().writer(sink.clone()).build().unwrap();
        Log::log(
            &logger,
            &Record::builder()
                .args(format_args!("worker timed out"))
                .level(log::Level::Warn)
                .target("logveil_core::engine")
                .build(),
        );
        assert!(sink.contents().is_empty());
        assert!(is_internal("logveil"));
        assert!(!is_internal("logveiled_app"));
    }
}
