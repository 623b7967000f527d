// logveil/src/lib.rs
//! # logveil
//!
//! Leveled, structured logging that runs every message and every field value
//! through a [`SensitiveDataFilter`] before anything reaches a writer.
//!
//! ```rust
//! use logveil::{field, Logger, MemoryWriter};
//!
//! let sink = MemoryWriter::new();
//! let logger = Logger::builder().writer(sink.clone()).build().unwrap();
//! logger.info_with("login", &[field!("password", "hunter2"), field!("user", "ana")]);
//!
//! let line = sink.contents();
//! assert!(line.contains("password=[REDACTED]"));
//! assert!(line.contains("user=ana"));
//! ```
//!
//! License: MIT OR APACHE 2.0

pub mod cli;
pub mod commands;
pub mod config;
pub mod facade;
pub mod field;
pub mod format;
pub mod level;
pub mod logger;
pub mod security;
pub mod writer;

pub use config::LoggerConfig;
pub use field::Field;
pub use format::{Caller, Entry, FormatKind, Formatter, JsonFormatter, TextFormatter};
pub use level::{Level, ParseLevelError};
pub use logger::{FatalHook, Logger, LoggerBuilder, LoggerError, LoggerOptions};
pub use security::SecurityConfig;
pub use writer::{BoxedWriter, MemoryWriter, Output};

pub use logveil_core::{
    FilterConfig, FilterError, PresetTier, SensitiveDataFilter, SharedValue, StructValue, Value,
};
