//! JSON output formatter.

use crate::scan::ScanReport;

/// Formats a [`ScanReport`] as pretty-printed JSON.
///
/// # Panics
///
/// Panics if the report cannot be serialized (should not happen with valid
/// data).
pub fn format(report: &ScanReport) -> String {
    serde_json::to_string_pretty(report).expect("JSON serialization failed")
}
