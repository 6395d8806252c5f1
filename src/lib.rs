//! Normalizes static-analysis tool output into a common finding model.
//!
//! Format adapters ([`parser::FindingParser`]) turn raw tool output into a
//! [`report::Report`] of immutable [`report::Finding`]s. Two enrichment
//! passes follow: the [`fingerprint`] engine assigns a content-derived
//! identity to every finding so the same defect can be recognized after
//! nearby code shifts, and the [`modules`] resolver assigns the logical
//! build unit a finding belongs to. Trend-tracking consumers compare the
//! fingerprints of two runs.

pub mod config;
pub mod encoding;
pub mod engine;
pub mod fingerprint;
pub mod modules;
pub mod parser;
pub mod report;

pub use config::EngineConfig;
pub use encoding::Encoding;
pub use engine::{ParseJob, Pipeline};
pub use fingerprint::{FingerprintGenerator, FullTextFingerprint};
pub use modules::{BuildFileModuleDetector, ModuleDetector, ModuleResolver};
pub use parser::{FindingParser, ParsingError};
pub use report::{Finding, FindingBuilder, Report, Severity};
