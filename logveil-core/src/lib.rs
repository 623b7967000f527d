// logveil-core/src/lib.rs
//! # logveil Core Library
//!
//! `logveil-core` is the sensitive-data filter behind the `logveil` logger. It
//! redacts secrets from freeform text and from arbitrarily nested structured
//! values before they are written anywhere, with bounded latency and without
//! holding locks across a scan.
//!
//! ## Modules
//!
//! * `patterns`: Built-in detector tiers, user pattern validation (including the
//!   backtracking-hazard scan) and the field-name heuristic.
//! * `engine`: Span collection, merging and splicing, chunked scanning, truncation
//!   of oversized input and the timeout-guarded worker.
//! * `value`: The dynamic `Value` model used for structured fields.
//! * `walker`: Recursive filtering of `Value` trees with cycle and depth guards.
//! * `filter`: `SensitiveDataFilter`, the thread-safe facade over all of the above.
//! * `config`: Marker constants, `RedactionLimits` and YAML-backed `FilterConfig`.
//! * `validators`: Programmatic checks (Luhn, SSN, NINO) that prune regex candidates.
//! * `errors`: `FilterError`, returned when a pattern is rejected.
//!
//! ## Public API
//!
//! **Filtering**
//!
//! * [`SensitiveDataFilter`]: Construct with `new()` (full tier), `basic()`, `empty()`
//!   or `custom(&patterns)`, then call `filter`, `filter_field_value` or
//!   `filter_value_recursive`.
//! * [`Value`], [`StructValue`], [`SharedValue`]: Structured data the filter can walk.
//!
//! **Configuration**
//!
//! * [`FilterConfig`]: Loads a filter description from YAML and builds it.
//! * [`RedactionLimits`]: Thresholds, chunk sizes, timeout and worker limit.
//! * [`PresetTier`]: Which built-in set to start from.
//!
//! ## Usage Example
//!
//! ```rust
//! use logveil_core::{SensitiveDataFilter, Value};
//!
//! let filter = SensitiveDataFilter::new();
//! assert_eq!(filter.filter("password=hunter2"), "password=[REDACTED]");
//!
//! let redacted = filter.filter_value_recursive("api_key", &Value::from("abc123"));
//! assert_eq!(redacted, Value::from("[REDACTED]"));
//! ```
//!
//! License: MIT OR APACHE 2.0

pub mod config;
pub mod engine;
pub mod errors;
pub mod filter;
pub mod patterns;
pub mod validators;
pub mod value;
pub mod walker;

pub use config::{
    FilterConfig, LimitOverrides, RedactionLimits, CIRCULAR_REFERENCE, MAX_DEPTH_EXCEEDED,
    MAX_PATTERN_LENGTH, MAX_RECURSION_DEPTH, REDACTED, TRUNCATION_SUFFIX,
};
pub use errors::FilterError;
pub use filter::SensitiveDataFilter;
pub use patterns::keys::is_sensitive_key;
pub use patterns::{validate_pattern, Pattern, PatternSafety, PatternSet, PresetTier};
pub use value::{SharedValue, StructField, StructValue, Value};
