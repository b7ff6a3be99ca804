//! Runtime Diagnostics
//!
//! Non-fatal anomalies (a bad conversion, division by zero, indexing a
//! scalar) never abort the program. The operation picks a deterministic
//! fallback result and reports what happened here.
//!
//! Every report is:
//! - counted per kind in process-wide atomics (read by the at-exit report),
//! - counted per thread and stored in a thread-local "last diagnostic" slot,
//!   so callers and tests can inspect what the last operation produced,
//! - forwarded to a sink: an installed custom sink, or the default one
//!   selected by `MIXED_DIAGNOSTICS`.
//!
//! `MIXED_DIAGNOSTICS` values:
//! - unset or `log` → `tracing` events on target `mixed::diagnostics`
//! - `stderr` → one line per diagnostic on stderr
//! - `off` → counted and stored only
//!
//! # Usage
//!
//! ```
//! use mixed_core::diagnostics::{self, DiagnosticKind};
//! use mixed_core::runtime_warning;
//!
//! runtime_warning!(DiagnosticKind::Conversion, "Wrong conversion from array to {}", "int");
//! let last = diagnostics::take_last_diagnostic().unwrap();
//! assert_eq!(last.message, "Wrong conversion from array to int");
//! ```

use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::ffi::{CString, c_char};
use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

/// What kind of anomaly was diagnosed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A value was converted in a way the language considers suspicious
    Conversion,
    /// A checked accessor found a different type than it asked for
    ExpectedType,
    DivisionByZero,
    /// An operator was applied to operand types it does not support
    UnsupportedOperand,
    /// A key or offset that cannot address the target
    IllegalOffset,
    /// A container operation on a value that is not an array
    NotAnArray,
}

impl DiagnosticKind {
    pub const ALL: [DiagnosticKind; 6] = [
        DiagnosticKind::Conversion,
        DiagnosticKind::ExpectedType,
        DiagnosticKind::DivisionByZero,
        DiagnosticKind::UnsupportedOperand,
        DiagnosticKind::IllegalOffset,
        DiagnosticKind::NotAnArray,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::Conversion => "conversion",
            DiagnosticKind::ExpectedType => "expected_type",
            DiagnosticKind::DivisionByZero => "division_by_zero",
            DiagnosticKind::UnsupportedOperand => "unsupported_operand",
            DiagnosticKind::IllegalOffset => "illegal_offset",
            DiagnosticKind::NotAnArray => "not_an_array",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Notice => "Notice",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        };
        write!(f, "{}: {}", level, self.message)
    }
}

/// Destination for diagnostics
///
/// Sinks are fire-and-forget: they must not panic and cannot fail the
/// operation that produced the diagnostic.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Emits each diagnostic as a `tracing` event
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: &Diagnostic) {
        let kind = diagnostic.kind.name();
        match diagnostic.severity {
            Severity::Notice => {
                tracing::debug!(target: "mixed::diagnostics", kind, "{}", diagnostic.message)
            }
            Severity::Warning => {
                tracing::warn!(target: "mixed::diagnostics", kind, "{}", diagnostic.message)
            }
            Severity::Error => {
                tracing::error!(target: "mixed::diagnostics", kind, "{}", diagnostic.message)
            }
        }
    }
}

/// Writes `Warning: message` lines to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn report(&self, diagnostic: &Diagnostic) {
        eprintln!("{}", diagnostic);
    }
}

// =============================================================================
// Sink configuration (parsed from MIXED_DIAGNOSTICS env var)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    Log,
    Stderr,
    Off,
}

impl SinkMode {
    pub fn parse(val: &str) -> Option<Self> {
        match val {
            "" | "log" => Some(SinkMode::Log),
            "stderr" => Some(SinkMode::Stderr),
            "off" | "0" => Some(SinkMode::Off),
            _ => None,
        }
    }

    /// Parse from MIXED_DIAGNOSTICS environment variable
    pub fn from_env() -> Self {
        let Ok(val) = std::env::var("MIXED_DIAGNOSTICS") else {
            return SinkMode::Log;
        };
        SinkMode::parse(&val).unwrap_or_else(|| {
            eprintln!(
                "Warning: MIXED_DIAGNOSTICS='{}' not recognized, using 'log'",
                val
            );
            SinkMode::Log
        })
    }
}

static SINK_MODE: OnceLock<SinkMode> = OnceLock::new();

fn sink_mode() -> SinkMode {
    *SINK_MODE.get_or_init(SinkMode::from_env)
}

static CUSTOM_SINK: RwLock<Option<Arc<dyn DiagnosticSink>>> = RwLock::new(None);

/// Route all diagnostics to `sink` instead of the configured default
pub fn set_sink(sink: Arc<dyn DiagnosticSink>) {
    let mut slot = CUSTOM_SINK.write().unwrap_or_else(|e| e.into_inner());
    *slot = Some(sink);
}

/// Go back to the sink selected by `MIXED_DIAGNOSTICS`
pub fn reset_sink() {
    let mut slot = CUSTOM_SINK.write().unwrap_or_else(|e| e.into_inner());
    *slot = None;
}

fn custom_sink() -> Option<Arc<dyn DiagnosticSink>> {
    CUSTOM_SINK
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

/// Install a `tracing-subscriber` fmt subscriber filtered by `RUST_LOG`
///
/// Does nothing if a global subscriber is already set.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

// =============================================================================
// Counters and the last-diagnostic slot
// =============================================================================

static COUNTS: [AtomicU64; 6] = [const { AtomicU64::new(0) }; 6];

thread_local! {
    /// Last diagnostic reported on this thread
    static LAST_DIAGNOSTIC: RefCell<Option<Diagnostic>> = const { RefCell::new(None) };

    /// Cached C string for FFI access
    static DIAGNOSTIC_CSTRING: RefCell<Option<CString>> = const { RefCell::new(None) };

    /// Diagnostics reported on this thread since it started
    static THREAD_COUNT: Cell<u64> = const { Cell::new(0) };
}

/// Report a diagnostic: count it, remember it, forward it to the sink
pub fn report(severity: Severity, kind: DiagnosticKind, message: impl Into<String>) {
    let diagnostic = Diagnostic {
        severity,
        kind,
        message: message.into(),
    };

    COUNTS[kind.index()].fetch_add(1, Ordering::Relaxed);
    THREAD_COUNT.with(|c| c.set(c.get() + 1));

    match custom_sink() {
        Some(sink) => sink.report(&diagnostic),
        None => match sink_mode() {
            SinkMode::Log => LogSink.report(&diagnostic),
            SinkMode::Stderr => StderrSink.report(&diagnostic),
            SinkMode::Off => {}
        },
    }

    // Clear cached CString first to prevent stale pointers
    DIAGNOSTIC_CSTRING.with(|cs| *cs.borrow_mut() = None);
    LAST_DIAGNOSTIC.with(|d| *d.borrow_mut() = Some(diagnostic));
}

/// Report a warning with a formatted message
#[macro_export]
macro_rules! runtime_warning {
    ($kind:expr, $($arg:tt)+) => {
        $crate::diagnostics::report(
            $crate::diagnostics::Severity::Warning,
            $kind,
            format!($($arg)+),
        )
    };
}

/// Take (and clear) the last diagnostic reported on this thread
pub fn take_last_diagnostic() -> Option<Diagnostic> {
    LAST_DIAGNOSTIC.with(|d| d.borrow_mut().take())
}

/// Check if this thread has an unread diagnostic
pub fn has_diagnostic() -> bool {
    LAST_DIAGNOSTIC.with(|d| d.borrow().is_some())
}

pub fn clear_last_diagnostic() {
    LAST_DIAGNOSTIC.with(|d| *d.borrow_mut() = None);
    DIAGNOSTIC_CSTRING.with(|cs| *cs.borrow_mut() = None);
}

/// Take the last diagnostic's message as a C string pointer
///
/// Returns null if no diagnostic is pending. The pointer stays valid until
/// the next diagnostic is reported on this thread or the slot is cleared.
pub fn take_last_diagnostic_c_str() -> *const c_char {
    match take_last_diagnostic() {
        Some(d) => DIAGNOSTIC_CSTRING.with(|cs| {
            // Interior NULs would truncate the message; replace them
            let safe = d.message.replace('\0', "?");
            match CString::new(safe) {
                Ok(cstring) => {
                    let ptr = cstring.as_ptr();
                    *cs.borrow_mut() = Some(cstring);
                    ptr
                }
                Err(_) => ptr::null(),
            }
        }),
        None => ptr::null(),
    }
}

/// Number of diagnostics reported on the calling thread
pub fn thread_diagnostic_count() -> u64 {
    THREAD_COUNT.with(|c| c.get())
}

/// Snapshot of the process-wide counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticCounts {
    pub by_kind: Vec<(DiagnosticKind, u64)>,
    pub total: u64,
}

impl DiagnosticCounts {
    pub fn get(&self, kind: DiagnosticKind) -> u64 {
        self.by_kind
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, n)| *n)
    }
}

pub fn counts() -> DiagnosticCounts {
    let by_kind: Vec<(DiagnosticKind, u64)> = DiagnosticKind::ALL
        .iter()
        .map(|&kind| (kind, COUNTS[kind.index()].load(Ordering::Relaxed)))
        .collect();
    let total = by_kind.iter().map(|(_, n)| n).sum();
    DiagnosticCounts { by_kind, total }
}

pub fn reset_counts() {
    for counter in &COUNTS {
        counter.store(0, Ordering::Relaxed);
    }
}
