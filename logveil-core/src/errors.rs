//! errors.rs - Error types for the logveil-core library.
//!
//! Only pattern registration can fail. Filtering itself is infallible: timeouts,
//! cycles and depth overflow resolve to marker tokens instead of errors.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// Every way a pattern can be rejected by the registry.
///
/// `#[non_exhaustive]` so new rejection reasons can be added without breaking
/// downstream `match` statements.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FilterError {
    #[error("pattern is empty")]
    EmptyPattern,

    #[error("pattern length ({0}) exceeds maximum allowed ({1})")]
    PatternTooLong(usize, usize),

    #[error("pattern '{pattern}' rejected: {reason} that may cause ReDoS")]
    ReDoSPattern { pattern: String, reason: String },

    #[error("failed to compile pattern '{0}': {1}")]
    InvalidPattern(String, regex::Error),

    #[error("pattern #{index} in batch rejected, no patterns were added: {source}")]
    Batch {
        index: usize,
        #[source]
        source: Box<FilterError>,
    },
}

impl FilterError {
    /// Returns the innermost rejection, unwrapping batch context.
    pub fn root(&self) -> &FilterError {
        match self {
            FilterError::Batch { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when the pattern was rejected as a backtracking hazard.
    pub fn is_redos(&self) -> bool {
        matches!(self.root(), FilterError::ReDoSPattern { .. })
    }
}
