use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::collection::Report;
use super::finding::{Finding, Severity};

/// Flat view of a report for JSON export. Trend-tracking consumers compare
/// fingerprints between two of these documents.
#[derive(Serialize)]
struct ReportDocument<'a> {
    size: usize,
    duplicates: usize,
    summary: SeveritySummary,
    origins: &'a BTreeMap<String, usize>,
    modules: &'a BTreeMap<String, usize>,
    findings: &'a [Arc<Finding>],
    info_messages: &'a [String],
    error_messages: &'a [String],
}

#[derive(Serialize)]
struct SeveritySummary {
    error: usize,
    high: usize,
    normal: usize,
    low: usize,
}

/// Render a report as pretty-printed JSON.
pub fn render(report: &Report) -> Result<String, serde_json::Error> {
    let findings: Vec<Arc<Finding>> = report.iter().cloned().collect();
    let document = ReportDocument {
        size: report.len(),
        duplicates: report.duplicates_size(),
        summary: SeveritySummary {
            error: report.count_by_severity(Severity::Error),
            high: report.count_by_severity(Severity::High),
            normal: report.count_by_severity(Severity::Normal),
            low: report.count_by_severity(Severity::Low),
        },
        origins: report.origins(),
        modules: report.modules(),
        findings: &findings,
        info_messages: report.info_messages(),
        error_messages: report.error_messages(),
    };
    serde_json::to_string_pretty(&document)
}
