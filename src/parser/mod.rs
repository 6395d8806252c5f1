pub mod clang_tidy;
pub mod dupfinder;
pub mod pmd;
pub mod reader;
pub mod xml;

use thiserror::Error;

use crate::report::Report;
use reader::ReaderFactory;

/// Errors surfaced by format adapters.
#[derive(Debug, Error)]
pub enum ParsingError {
    /// The input is structurally not what the adapter expects.
    #[error("'{source_id}': {message}")]
    Format { source_id: String, message: String },
    /// The input could not be read at all.
    #[error("can't read '{source_id}': {message}")]
    FileAccess { source_id: String, message: String },
    /// The caller aborted the parse.
    #[error("parsing canceled")]
    Canceled,
}

impl ParsingError {
    pub fn format(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        ParsingError::Format {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    pub fn file_access(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        ParsingError::FileAccess {
            source_id: source_id.into(),
            message: message.into(),
        }
    }
}

/// The single contract every format adapter implements. The engine never
/// looks past this trait: a new tool format is a new implementation, not a
/// change to the core.
pub trait FindingParser: Send + Sync {
    /// Tool id, also recorded as the origin of produced findings.
    fn name(&self) -> &'static str;

    /// Short description of the format this adapter understands.
    fn description(&self) -> &'static str;

    /// Extract all findings from the given input. Adapters may be partially
    /// tolerant and skip entries they cannot make sense of.
    fn parse(&self, factory: &dyn ReaderFactory) -> Result<Report, ParsingError>;
}

/// Registry of the shipped format adapters.
pub fn all_parsers() -> Vec<Box<dyn FindingParser>> {
    vec![
        Box::new(pmd::PmdParser::new()),
        Box::new(clang_tidy::ClangTidyParser::new()),
        Box::new(dupfinder::DupFinderParser::new()),
    ]
}

/// Look up an adapter by tool id.
pub fn find_parser(name: &str) -> Option<Box<dyn FindingParser>> {
    all_parsers()
        .into_iter()
        .find(|parser| parser.name().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_by_name() {
        assert!(find_parser("pmd").is_some());
        assert!(find_parser("PMD").is_some());
        assert!(find_parser("clang-tidy").is_some());
        assert!(find_parser("dupfinder").is_some());
        assert!(find_parser("no-such-tool").is_none());
    }

    #[test]
    fn parsers_have_distinct_names() {
        let parsers = all_parsers();
        let mut names: Vec<&str> = parsers.iter().map(|p| p.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), parsers.len());
    }
}
