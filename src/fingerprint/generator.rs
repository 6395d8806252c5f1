use std::sync::Arc;

use tracing::debug;

use super::full_text::{FileReadError, FullTextFingerprint};
use crate::encoding::Encoding;
use crate::report::{FilteredLog, Finding, Report};

/// Assigns an identity to every finding of a report that lacks one.
///
/// Findings that already carry a fingerprint are left untouched, so the
/// pass is idempotent and safe to re-run. Read failures never abort the
/// pass: the affected finding gets a structural fallback and one capped
/// diagnostic line.
#[derive(Debug)]
pub struct FingerprintGenerator {
    max_log_lines: usize,
}

impl FingerprintGenerator {
    pub fn new() -> Self {
        FingerprintGenerator {
            max_log_lines: FilteredLog::DEFAULT_MAX_LINES,
        }
    }

    /// Cap on the per-run diagnostic lines about unreadable files.
    pub fn with_log_cap(max_log_lines: usize) -> Self {
        FingerprintGenerator { max_log_lines }
    }

    pub fn run(&self, fingerprint: &mut FullTextFingerprint, report: &mut Report, encoding: Encoding) {
        let mut log = FilteredLog::new(
            "Can't create fingerprints for some files:",
            self.max_log_lines,
        );
        let findings: Vec<Arc<Finding>> = report.iter().cloned().collect();

        let mut created = 0;
        for finding in &findings {
            if finding.has_fingerprint() {
                continue;
            }
            if compute(fingerprint, finding, encoding, &mut log) {
                created += 1;
            }
        }

        report.log_info(format!(
            "-> created fingerprints for {} findings (skipped {} findings)",
            created,
            report.len() - created
        ));
        log.log_summary();
        log.flush_to(report);
    }
}

/// Content fingerprint when possible, structural fallback otherwise.
/// Returns whether a content fingerprint was created.
fn compute(
    fingerprint: &mut FullTextFingerprint,
    finding: &Finding,
    encoding: Encoding,
    log: &mut FilteredLog,
) -> bool {
    if finding.has_file_name() {
        match fingerprint.compute(finding.file_name(), finding.line_start(), encoding) {
            Ok(digest) => {
                finding.set_fingerprint(digest);
                return true;
            }
            Err(FileReadError::NotFound(path)) => {
                log.log_error(format!("- '{path}' file not found"));
            }
            Err(FileReadError::Encoding { path, encoding }) => {
                log.log_error(format!(
                    "- '{path}', provided encoding '{encoding}' seems to be wrong"
                ));
            }
            Err(error @ FileReadError::Io { .. }) => {
                log.log_error(format!("- {error}"));
            }
        }
        debug!(
            "Falling back to a structural fingerprint for {}",
            finding.file_name()
        );
    }
    finding.set_fingerprint(structural_fingerprint(finding));
    false
}

/// Positional identity used when the affected file cannot be hashed.
/// Deterministic across runs; not a cryptographic hash.
pub fn structural_fingerprint(finding: &Finding) -> String {
    let mut hash: u64 = 17;
    for part in [
        finding.base_name(),
        finding.kind(),
        finding.category(),
        finding.severity().as_str(),
        finding.origin(),
    ] {
        hash = combine(hash, part.as_bytes());
    }
    hash = hash.wrapping_mul(31).wrapping_add(finding.line_start() as u64);
    format!("FALLBACK-{hash:x}")
}

impl Default for FingerprintGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn combine(mut hash: u64, bytes: &[u8]) -> u64 {
    hash = hash.wrapping_mul(31);
    for &byte in bytes {
        hash = hash.wrapping_mul(31).wrapping_add(u64::from(byte));
    }
    hash
}
