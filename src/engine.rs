use rayon::prelude::*;
use tracing::info;

use crate::config::EngineConfig;
use crate::encoding::Encoding;
use crate::fingerprint::{FingerprintGenerator, FullTextFingerprint};
use crate::modules::{ModuleDetector, ModuleResolver};
use crate::parser::reader::ReaderFactory;
use crate::parser::{FindingParser, ParsingError};
use crate::report::Report;

/// One piece of tool output waiting to be parsed.
pub struct ParseJob {
    pub parser: Box<dyn FindingParser>,
    pub factory: Box<dyn ReaderFactory>,
}

/// Runs the enrichment passes over parsed reports.
///
/// Each report goes through the fingerprint pass and then the module
/// resolver, sequentially; each pass is idempotent. Independent reports
/// share no mutable state, so `run_all` fans them out in parallel.
pub struct Pipeline {
    context_lines: usize,
    max_log_lines: usize,
    encoding: Encoding,
    detector: Option<Box<dyn ModuleDetector + Send + Sync>>,
}

impl Pipeline {
    pub fn new(config: &EngineConfig) -> Self {
        Pipeline {
            context_lines: config.fingerprint.context_lines,
            max_log_lines: config.diagnostics.max_log_lines,
            encoding: config.input.encoding,
            detector: None,
        }
    }

    /// Use the given strategy to resolve module names. Without one, the
    /// module pass is skipped.
    pub fn with_detector(mut self, detector: Box<dyn ModuleDetector + Send + Sync>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Run the enrichment passes over one report.
    pub fn process(&self, report: &mut Report) {
        let mut fingerprint = FullTextFingerprint::with_context(self.context_lines);
        FingerprintGenerator::with_log_cap(self.max_log_lines).run(&mut fingerprint, report, self.encoding);
        if let Some(ref detector) = self.detector {
            ModuleResolver::new().run(report, detector.as_ref());
        }
    }

    /// Parse and process every job. Jobs are independent and run in
    /// parallel; the result order matches the input order.
    pub fn run_all(&self, jobs: Vec<ParseJob>) -> Vec<Result<Report, ParsingError>> {
        info!("Processing {} parse jobs", jobs.len());
        jobs.into_par_iter()
            .map(|job| {
                let mut report = job.parser.parse(job.factory.as_ref())?;
                self.process(&mut report);
                Ok(report)
            })
            .collect()
    }
}
