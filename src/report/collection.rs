use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::finding::{Finding, Severity};

/// Content identity of a finding inside one report. Two findings with the
/// same key report the same defect, whatever their identifiers say.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DupKey {
    file_name: String,
    line_start: usize,
    line_end: usize,
    category: String,
    kind: String,
    message: String,
    package_name: String,
}

impl DupKey {
    fn of(finding: &Finding) -> Self {
        DupKey {
            file_name: finding.file_name().to_owned(),
            line_start: finding.line_start(),
            line_end: finding.line_end(),
            category: finding.category().to_owned(),
            kind: finding.kind().to_owned(),
            message: finding.message().to_owned(),
            package_name: finding.package_name().to_owned(),
        }
    }
}

/// Ordered, deduplicating container for the findings of one parse run.
///
/// Keeps insertion order, counts (but does not store) content duplicates,
/// and carries the run's info and error diagnostics. Findings are shared:
/// a filtered view references the same instances as its parent.
#[derive(Debug, Default)]
pub struct Report {
    findings: Vec<Arc<Finding>>,
    seen: HashSet<DupKey>,
    duplicate_count: usize,
    info_messages: Vec<String>,
    error_messages: Vec<String>,
    severity_counts: [usize; 4],
    origin_counts: BTreeMap<String, usize>,
    module_counts: BTreeMap<String, usize>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finding unless an equal one is already present. Duplicates
    /// bump the duplicate counter and are dropped silently; adding never
    /// fails.
    pub fn add(&mut self, finding: Finding) {
        self.add_shared(Arc::new(finding));
    }

    pub(crate) fn add_shared(&mut self, finding: Arc<Finding>) {
        if !self.seen.insert(DupKey::of(&finding)) {
            self.duplicate_count += 1;
            return;
        }
        self.severity_counts[finding.severity().index()] += 1;
        *self
            .origin_counts
            .entry(finding.origin().to_owned())
            .or_default() += 1;
        *self
            .module_counts
            .entry(finding.module_name().to_owned())
            .or_default() += 1;
        self.findings.push(finding);
    }

    /// Append every finding, preserving the relative order of both inputs.
    pub fn add_all(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            self.add(finding);
        }
    }

    /// Merge another report into this one: findings (deduplicated against
    /// this report), diagnostics, and the duplicate counter.
    pub fn append(&mut self, other: Report) {
        for finding in other.findings {
            self.add_shared(finding);
        }
        self.duplicate_count += other.duplicate_count;
        self.info_messages.extend(other.info_messages);
        self.error_messages.extend(other.error_messages);
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn get(&self, index: usize) -> &Arc<Finding> {
        &self.findings[index]
    }

    /// Iterate the findings in insertion order. Iteration never mutates the
    /// report and can be restarted freely.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Finding>> {
        self.findings.iter()
    }

    /// Number of content duplicates that were dropped by `add`.
    pub fn duplicates_size(&self) -> usize {
        self.duplicate_count
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.severity_counts[severity.index()]
    }

    /// Severities that occur in this report, most severe first.
    pub fn severities(&self) -> Vec<Severity> {
        Severity::ALL
            .into_iter()
            .rev()
            .filter(|severity| self.count_by_severity(*severity) > 0)
            .collect()
    }

    /// Findings per origin, maintained incrementally on every `add`.
    pub fn origins(&self) -> &BTreeMap<String, usize> {
        &self.origin_counts
    }

    /// Findings per module. Refreshed by the module resolver after it
    /// assigns names that were unknown at `add` time.
    pub fn modules(&self) -> &BTreeMap<String, usize> {
        &self.module_counts
    }

    pub(crate) fn refresh_module_counts(&mut self) {
        self.module_counts.clear();
        for finding in &self.findings {
            *self
                .module_counts
                .entry(finding.module_name().to_owned())
                .or_default() += 1;
        }
    }

    /// A new report over the findings that match the predicate. The
    /// instances are shared with this report, and their order is kept.
    pub fn filter(&self, predicate: impl Fn(&Finding) -> bool) -> Report {
        let mut filtered = Report::new();
        for finding in &self.findings {
            if predicate(finding) {
                filtered.add_shared(Arc::clone(finding));
            }
        }
        filtered
    }

    /// Append one line to the info channel. Always succeeds.
    pub fn log_info(&mut self, message: impl Into<String>) {
        self.info_messages.push(message.into());
    }

    /// Append one line to the error channel. Always succeeds.
    pub fn log_error(&mut self, message: impl Into<String>) {
        self.error_messages.push(message.into());
    }

    pub fn info_messages(&self) -> &[String] {
        &self.info_messages
    }

    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a Arc<Finding>;
    type IntoIter = std::slice::Iter<'a, Arc<Finding>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
