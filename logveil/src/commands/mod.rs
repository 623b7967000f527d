//! Implementations of the `logveil` subcommands.
//!
//! Each command reads its arguments from `crate::cli` and writes to the
//! handles it is given, so the binary and the tests drive them the same way.
//!
//! License: MIT OR APACHE 2.0

pub mod check;
pub mod emit;
pub mod filter;
pub mod patterns;
