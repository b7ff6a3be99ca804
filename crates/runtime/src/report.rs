//! At-exit diagnostics report
//!
//! Summarizes how many diagnostics of each kind the program produced,
//! controlled by the `MIXED_REPORT` env var:
//! - Unset or `0` → no report, zero cost
//! - `1` → human-readable to stderr
//! - `json` → JSON to stderr
//! - `json:/path` → JSON to file
//!
//! ## Feature Flag
//!
//! JSON output requires the `report-json` feature (enabled by default).
//! Without it, JSON requests fall back to the human format.

use mixed_core::diagnostics::{self, DiagnosticCounts};
use std::io::Write;
use std::sync::OnceLock;

// =============================================================================
// Report Configuration (parsed from MIXED_REPORT env var)
// =============================================================================

/// Output format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportFormat {
    Human,
    Json,
}

/// Output destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportDestination {
    Stderr,
    File(String),
}

/// Parsed report configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub format: ReportFormat,
    pub destination: ReportDestination,
}

impl ReportConfig {
    /// Parse a `MIXED_REPORT` value; `None` means no report
    pub fn parse(val: &str) -> Option<Self> {
        match val {
            "" | "0" => None,
            "1" => Some(ReportConfig {
                format: ReportFormat::Human,
                destination: ReportDestination::Stderr,
            }),
            "json" => Some(ReportConfig {
                format: ReportFormat::Json,
                destination: ReportDestination::Stderr,
            }),
            s if s.starts_with("json:") => Some(ReportConfig {
                format: ReportFormat::Json,
                destination: ReportDestination::File(s["json:".len()..].to_string()),
            }),
            _ => {
                eprintln!("Warning: MIXED_REPORT='{}' not recognized, ignoring", val);
                None
            }
        }
    }

    /// Parse from MIXED_REPORT environment variable
    pub fn from_env() -> Option<Self> {
        let val = std::env::var("MIXED_REPORT").ok()?;
        Self::parse(&val)
    }
}

static REPORT_CONFIG: OnceLock<Option<ReportConfig>> = OnceLock::new();

fn get_report_config() -> &'static Option<ReportConfig> {
    REPORT_CONFIG.get_or_init(ReportConfig::from_env)
}

// =============================================================================
// Formatting
// =============================================================================

pub fn format_human(counts: &DiagnosticCounts) -> String {
    let mut out = String::new();
    out.push_str("=== MIXED DIAGNOSTICS ===\n");
    for (kind, count) in &counts.by_kind {
        out.push_str(&format!("{:20} {}\n", kind.name(), count));
    }
    out.push_str(&format!("{:20} {}\n", "total", counts.total));
    out.push_str("=========================\n");
    out
}

#[cfg(feature = "report-json")]
pub fn format_json(counts: &DiagnosticCounts) -> String {
    let by_kind: serde_json::Map<String, serde_json::Value> = counts
        .by_kind
        .iter()
        .map(|(kind, count)| {
            (
                kind.name().to_string(),
                serde_json::Value::Number((*count).into()),
            )
        })
        .collect();

    let mut map = serde_json::Map::new();
    map.insert("diagnostics".into(), serde_json::Value::Object(by_kind));
    map.insert(
        "total".into(),
        serde_json::Value::Number(counts.total.into()),
    );

    let obj = serde_json::Value::Object(map);
    serde_json::to_string(&obj).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(not(feature = "report-json"))]
pub fn format_json(counts: &DiagnosticCounts) -> String {
    eprintln!(
        "Warning: MIXED_REPORT=json requires the 'report-json' feature. Falling back to human format."
    );
    format_human(counts)
}

// =============================================================================
// Emit
// =============================================================================

fn render(config: &ReportConfig) -> String {
    let counts = diagnostics::counts();
    match config.format {
        ReportFormat::Human => format_human(&counts),
        ReportFormat::Json => format_json(&counts),
    }
}

/// Write the report for `config` to its destination
pub fn emit_report_with(config: &ReportConfig) {
    let output = render(config);

    match &config.destination {
        ReportDestination::Stderr => {
            let _ = std::io::stderr().write_all(output.as_bytes());
        }
        ReportDestination::File(path) => {
            if let Ok(mut f) = std::fs::File::create(path) {
                let _ = f.write_all(output.as_bytes());
            } else {
                eprintln!("Warning: could not write report to {}", path);
                let _ = std::io::stderr().write_all(output.as_bytes());
            }
        }
    }
}

/// Emit the report configured by `MIXED_REPORT`, if any
pub fn emit_report() {
    if let Some(config) = get_report_config() {
        emit_report_with(config);
    }
}

// =============================================================================
// FFI Entry Points
// =============================================================================

/// At-exit report, called from the generated program's exit path
///
/// # Safety
/// Safe to call from any context.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mixed_report() {
    emit_report();
}
