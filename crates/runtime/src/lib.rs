//! Mixed Runtime: the dynamically-typed value for compiled code
//!
//! Key design principles:
//! - Value: a closed sum of Null, Bool, Int, Float, String and Array
//! - Every operation is total: anomalies emit a diagnostic and fall back
//! - Strings and arrays are shared until written (see `mixed-core`)
//!
//! Operations are spread over modules by concern: `coerce` converts,
//! `arithmetic` implements the operator traits and increments, `compare`
//! the loose ordering, `array_access` keyed reads and writes. `ffi`
//! exposes the same operations to generated code over the C ABI.

pub mod arithmetic;
pub mod array_access;
pub mod coerce;
pub mod compare;
pub mod error;
pub mod ffi;
pub mod report;
pub mod value;

pub use array_access::IntoKey;
pub use compare::{ge, gt, le, lt};
pub use error::ValueError;
pub use value::{Unknown, Value, ValueType};

// Containers and diagnostics from the core crate
pub use mixed_core::diagnostics::{
    Diagnostic, DiagnosticKind, DiagnosticSink, Severity, init_logging, take_last_diagnostic,
};
pub use mixed_core::{ArrayKey, Numeric, RcArray, RcString};

// At-exit report (exported for linking)
pub use report::mixed_report as report;
