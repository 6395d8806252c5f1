use quick_xml::events::Event;
use tracing::debug;

use super::reader::ReaderFactory;
use super::xml;
use super::{FindingParser, ParsingError};
use crate::report::{FindingBuilder, Report, Severity};

/// PMD priorities smaller than this value are mapped to high severity.
const HIGH_PRIORITY_BOUND: usize = 3;
/// PMD priorities greater than this value are mapped to low severity.
const LOW_PRIORITY_BOUND: usize = 4;

/// Parser for PMD XML reports.
///
/// Extracts `<violation>` elements per file plus `<error>` elements PMD
/// emits for inputs it could not process itself.
#[derive(Debug, Default)]
pub struct PmdParser;

impl PmdParser {
    pub fn new() -> Self {
        Self
    }
}

impl FindingParser for PmdParser {
    fn name(&self) -> &'static str {
        "pmd"
    }

    fn description(&self) -> &'static str {
        "Reads PMD XML reports"
    }

    fn parse(&self, factory: &dyn ReaderFactory) -> Result<Report, ParsingError> {
        let content = factory.read_string()?;
        let mut reader = xml::secure_reader(&content);

        let mut report = Report::new();
        let mut saw_root = false;
        let mut current_file = String::new();
        // At most one of these is live; text between its start and end tags
        // accumulates below.
        let mut violation: Option<FindingBuilder> = None;
        let mut error: Option<FindingBuilder> = None;
        let mut text = String::new();
        let mut buffer = Vec::new();

        loop {
            let event = reader
                .read_event_into(&mut buffer)
                .map_err(|error| ParsingError::format(factory.id(), format!("invalid XML: {error}")))?;
            match event {
                Event::Start(ref element) | Event::Empty(ref element) => {
                    match element.name().as_ref() {
                        b"pmd" => saw_root = true,
                        _ if !saw_root => {
                            return Err(ParsingError::format(
                                factory.id(),
                                "input is not a PMD report",
                            ));
                        }
                        b"file" => {
                            let attrs = xml::attributes(element);
                            current_file = attrs.get("name").cloned().unwrap_or_default();
                        }
                        b"violation" => {
                            let attrs = xml::attributes(element);
                            let mut builder = FindingBuilder::new();
                            builder
                                .origin(self.name())
                                .file_name(&current_file)
                                .line_start(xml::numeric(&attrs, "beginline"))
                                .line_end(xml::numeric(&attrs, "endline"))
                                .column_start(xml::numeric(&attrs, "begincolumn"))
                                .column_end(xml::numeric(&attrs, "endcolumn"))
                                .kind(attrs.get("rule").cloned().unwrap_or_default())
                                .category(attrs.get("ruleset").cloned().unwrap_or_default())
                                .package_name(attrs.get("package").cloned().unwrap_or_default())
                                .severity(map_priority(&attrs));
                            violation = Some(builder);
                            text.clear();
                        }
                        b"error" => {
                            let attrs = xml::attributes(element);
                            let mut builder = FindingBuilder::new();
                            builder
                                .origin(self.name())
                                .severity(Severity::Error)
                                .file_name(attrs.get("filename").cloned().unwrap_or_default())
                                .message(attrs.get("msg").cloned().unwrap_or_default());
                            error = Some(builder);
                            text.clear();
                        }
                        _ => {}
                    }
                    // Self-closing elements get no End event; finalize now.
                    if matches!(event, Event::Empty(_)) {
                        if let Some(builder) = violation.take().or_else(|| error.take()) {
                            report.add(builder.build());
                        }
                    }
                }
                Event::Text(ref content) => {
                    if violation.is_some() || error.is_some() {
                        text.push_str(&content.unescape().unwrap_or_default());
                    }
                }
                Event::End(ref element) => match element.name().as_ref() {
                    b"violation" => {
                        if let Some(mut builder) = violation.take() {
                            builder.message(close_sentence(text.trim()));
                            report.add(builder.build());
                        }
                    }
                    b"error" => {
                        if let Some(mut builder) = error.take() {
                            builder.description(text.trim());
                            report.add(builder.build());
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buffer.clear();
        }

        if !saw_root {
            return Err(ParsingError::format(factory.id(), "input is not a PMD report"));
        }
        debug!("PMD: {} findings from {}", report.len(), factory.id());
        Ok(report)
    }
}

fn map_priority(attrs: &std::collections::HashMap<String, String>) -> Severity {
    match xml::numeric(attrs, "priority") {
        0 => Severity::Normal,
        priority if priority < HIGH_PRIORITY_BOUND => Severity::High,
        priority if priority > LOW_PRIORITY_BOUND => Severity::Low,
        _ => Severity::Normal,
    }
}

/// PMD messages arrive with and without a trailing period; emit them
/// uniformly.
fn close_sentence(message: &str) -> String {
    if message.is_empty() || message.ends_with('.') {
        message.to_owned()
    } else {
        format!("{message}.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::reader::StringReaderFactory;

    const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pmd version="6.0.0" timestamp="2019-01-24T10:00:00.000">
    <file name="C:\Workspace\src\main\java\com\example\Sorter.java">
        <violation beginline="12" endline="14" begincolumn="9" endcolumn="20"
                   rule="EmptyCatchBlock" ruleset="Error Prone"
                   package="com.example" priority="1">
            Avoid empty catch blocks
        </violation>
        <violation beginline="25" endline="25" begincolumn="1" endcolumn="5"
                   rule="ShortVariable" ruleset="Code Style"
                   package="com.example" priority="5">
            Avoid variables with short names like q.
        </violation>
    </file>
    <error filename="/broken/Parse.java" msg="Parse failure">
        java.lang.RuntimeException: unexpected token
    </error>
</pmd>"#;

    fn parse(content: &str) -> Result<Report, ParsingError> {
        PmdParser::new().parse(&StringReaderFactory::new("pmd.xml", content))
    }

    #[test]
    fn extracts_violations_and_errors() {
        let report = parse(REPORT).unwrap();

        assert_eq!(report.len(), 3);

        let first = report.get(0);
        assert_eq!(first.file_name(), "C:/Workspace/src/main/java/com/example/Sorter.java");
        assert_eq!(first.line_start(), 12);
        assert_eq!(first.line_end(), 14);
        assert_eq!(first.column_start(), 9);
        assert_eq!(first.column_end(), 20);
        assert_eq!(first.kind(), "EmptyCatchBlock");
        assert_eq!(first.category(), "Error Prone");
        assert_eq!(first.package_name(), "com.example");
        assert_eq!(first.severity(), Severity::High);
        assert_eq!(first.message(), "Avoid empty catch blocks.");
        assert_eq!(first.origin(), "pmd");

        let second = report.get(1);
        assert_eq!(second.severity(), Severity::Low);
        // An already closed sentence does not get a second period.
        assert_eq!(second.message(), "Avoid variables with short names like q.");

        let error = report.get(2);
        assert_eq!(error.severity(), Severity::Error);
        assert_eq!(error.file_name(), "/broken/Parse.java");
        assert_eq!(error.message(), "Parse failure");
        assert!(error.description().contains("unexpected token"));
    }

    #[test]
    fn maps_priorities() {
        let content = |priority: usize| {
            format!(
                r#"<pmd><file name="A.java">
                   <violation beginline="1" rule="R" ruleset="S" priority="{priority}">m</violation>
                   </file></pmd>"#
            )
        };

        for (priority, severity) in [
            (1, Severity::High),
            (2, Severity::High),
            (3, Severity::Normal),
            (4, Severity::Normal),
            (5, Severity::Low),
        ] {
            let report = parse(&content(priority)).unwrap();
            assert_eq!(report.get(0).severity(), severity, "priority {priority}");
        }
    }

    #[test]
    fn rejects_non_pmd_documents() {
        let result = parse("<checkstyle><file name=\"A.java\"/></checkstyle>");
        assert!(matches!(result, Err(ParsingError::Format { .. })));

        let result = parse("");
        assert!(matches!(result, Err(ParsingError::Format { .. })));
    }

    #[test]
    fn rejects_malformed_xml() {
        let result = parse("<pmd><file name=\"A.java\">");
        assert!(result.is_err() || result.unwrap().is_empty());
    }
}
