//! Mixed Core: shared foundation for the dynamic value runtime
//!
//! This crate provides the pieces the `Value` type delegates to. It knows
//! nothing about `Value` itself.
//!
//! Key design principles:
//! - Strings and arrays are copy-on-write handles: cloning is a count bump
//! - Handles are one word wide so a tagged value stays two words
//! - Anomalies are diagnosed and resolved by fallback, never by aborting
//!
//! # Modules
//!
//! - `numeric`: the numeric-string grammar and float formatting
//! - `rcstring`: copy-on-write byte strings
//! - `rcarray`: copy-on-write insertion-ordered maps and array keys
//! - `diagnostics`: the diagnostics sink, counters and last-diagnostic slot

pub mod diagnostics;
pub mod numeric;
pub mod rcarray;
pub mod rcstring;

pub use diagnostics::{
    Diagnostic, DiagnosticKind, DiagnosticSink, Severity, clear_last_diagnostic, has_diagnostic,
    init_logging, report, take_last_diagnostic, thread_diagnostic_count,
};
pub use numeric::{Numeric, format_float, parse_numeric};
pub use rcarray::{ArrayKey, RcArray};
pub use rcstring::{CONST_REF_COUNT, MAX_STRING_LEN, RcString};
