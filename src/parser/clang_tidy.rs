use regex::Regex;
use tracing::debug;

use super::reader::ReaderFactory;
use super::{FindingParser, ParsingError};
use crate::report::{FindingBuilder, Report, Severity};

/// Parser for clang-tidy console output.
///
/// Matches `file:line:column: level: message [check]` lines; everything
/// else (notes, code excerpts, caret markers) is skipped.
pub struct ClangTidyParser {
    pattern: Regex,
}

impl ClangTidyParser {
    pub fn new() -> Self {
        let pattern = Regex::new(
            r"^(?P<file>.+?):(?P<line>\d+):(?P<column>\d+):\s+(?P<level>warning|error):\s+(?P<message>.*?)\s*\[(?P<check>[^\[\]]+)\]\s*$",
        )
        .unwrap();
        ClangTidyParser { pattern }
    }
}

impl Default for ClangTidyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FindingParser for ClangTidyParser {
    fn name(&self) -> &'static str {
        "clang-tidy"
    }

    fn description(&self) -> &'static str {
        "Reads clang-tidy console output"
    }

    fn parse(&self, factory: &dyn ReaderFactory) -> Result<Report, ParsingError> {
        let mut report = Report::new();
        let mut builder = FindingBuilder::new();
        builder.origin(self.name());

        for line in factory.read_lines()? {
            let Some(captures) = self.pattern.captures(&line) else {
                continue;
            };
            let (severity, kind) = if &captures["level"] == "error" {
                (Severity::High, "Error")
            } else {
                (Severity::Normal, "Warning")
            };
            builder
                .file_name(&captures["file"])
                .line_start(captures["line"].parse().unwrap_or(0))
                .column_start(captures["column"].parse().unwrap_or(0))
                .severity(severity)
                .kind(kind)
                .category(&captures["check"])
                .message(&captures["message"]);
            report.add(builder.build());
        }

        debug!("clang-tidy: {} findings from {}", report.len(), factory.id());
        Ok(report)
    }
}
