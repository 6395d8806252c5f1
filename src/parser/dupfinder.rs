use std::sync::Arc;

use quick_xml::events::Event;
use tracing::debug;

use super::reader::ReaderFactory;
use super::xml;
use super::{FindingParser, ParsingError};
use crate::report::{
    AdditionalProperties, DuplicationGroup, FindingBuilder, LineRange, Report, Severity,
};

/// One `<Fragment>` of a duplicate, collected while its elements stream by.
#[derive(Debug, Default)]
struct Fragment {
    file_name: String,
    line_start: usize,
    line_end: usize,
    text: Option<String>,
}

impl Fragment {
    fn lines(&self) -> usize {
        self.line_end.saturating_sub(self.line_start) + 1
    }
}

/// Parser for Resharper DupFinder XML reports.
///
/// Every `<Fragment>` of a `<Duplicate>` becomes one finding; all findings
/// of the duplicate share one `DuplicationGroup` and list their sibling
/// fragments as secondary line ranges.
#[derive(Debug)]
pub struct DupFinderParser {
    high_threshold: usize,
    normal_threshold: usize,
}

impl DupFinderParser {
    /// Default number of duplicated lines for high severity.
    pub const DEFAULT_HIGH_THRESHOLD: usize = 50;
    /// Default number of duplicated lines for normal severity.
    pub const DEFAULT_NORMAL_THRESHOLD: usize = 25;

    pub fn new() -> Self {
        Self::with_thresholds(Self::DEFAULT_HIGH_THRESHOLD, Self::DEFAULT_NORMAL_THRESHOLD)
    }

    /// Thresholds on the duplicated line count: at least `high_threshold`
    /// lines is high severity, at least `normal_threshold` is normal,
    /// anything shorter is low.
    pub fn with_thresholds(high_threshold: usize, normal_threshold: usize) -> Self {
        DupFinderParser {
            high_threshold,
            normal_threshold,
        }
    }

    fn severity_of(&self, duplicated_lines: usize) -> Severity {
        if duplicated_lines >= self.high_threshold {
            Severity::High
        } else if duplicated_lines >= self.normal_threshold {
            Severity::Normal
        } else {
            Severity::Low
        }
    }

    fn convert(&self, fragments: Vec<Fragment>, report: &mut Report) {
        if fragments.is_empty() {
            return;
        }
        let group = Arc::new(DuplicationGroup::new());
        if let Some(text) = fragments.iter().find_map(|fragment| fragment.text.as_ref()) {
            group.set_code_fragment(text);
        }

        for (index, fragment) in fragments.iter().enumerate() {
            let mut builder = FindingBuilder::new();
            builder
                .origin(self.name())
                .file_name(&fragment.file_name)
                .line_start(fragment.line_start)
                .line_end(fragment.line_end)
                .kind("Duplication")
                .category("Code Duplication")
                .message(format!("Duplication of {} lines.", fragment.lines()))
                .severity(self.severity_of(fragment.lines()))
                .additional_properties(AdditionalProperties::new(Arc::clone(&group)));
            for (sibling_index, sibling) in fragments.iter().enumerate() {
                if sibling_index != index {
                    builder.secondary_range(LineRange::new(sibling.line_start, sibling.line_end));
                }
            }
            report.add(builder.build());
        }
    }
}

impl Default for DupFinderParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FindingParser for DupFinderParser {
    fn name(&self) -> &'static str {
        "dupfinder"
    }

    fn description(&self) -> &'static str {
        "Reads Resharper DupFinder XML reports"
    }

    fn parse(&self, factory: &dyn ReaderFactory) -> Result<Report, ParsingError> {
        let content = factory.read_string()?;
        let mut reader = xml::secure_reader(&content);

        let mut report = Report::new();
        let mut saw_root = false;
        let mut fragments: Option<Vec<Fragment>> = None;
        let mut fragment: Option<Fragment> = None;
        // Name of the text-bearing element we are inside, if any.
        let mut capturing: Option<&'static str> = None;
        let mut buffer = Vec::new();

        loop {
            let event = reader
                .read_event_into(&mut buffer)
                .map_err(|error| ParsingError::format(factory.id(), format!("invalid XML: {error}")))?;
            match event {
                Event::Start(ref element) | Event::Empty(ref element) => {
                    capturing = None;
                    match element.name().as_ref() {
                        b"DuplicatesReport" => saw_root = true,
                        _ if !saw_root => {
                            return Err(ParsingError::format(
                                factory.id(),
                                "input is not a DupFinder report",
                            ));
                        }
                        b"Duplicate" => fragments = Some(Vec::new()),
                        b"Fragment" => fragment = Some(Fragment::default()),
                        b"FileName" => capturing = Some("FileName"),
                        b"Text" => capturing = Some("Text"),
                        b"LineRange" => {
                            if let Some(ref mut fragment) = fragment {
                                let attrs = xml::attributes(element);
                                fragment.line_start = xml::numeric(&attrs, "Start");
                                fragment.line_end = xml::numeric(&attrs, "End");
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(ref content) => {
                    if let (Some(what), Some(ref mut fragment)) = (capturing, fragment.as_mut()) {
                        let content = content.unescape().unwrap_or_default();
                        match what {
                            "FileName" => fragment.file_name.push_str(&content),
                            _ => {
                                let text = fragment.text.get_or_insert_with(String::new);
                                text.push_str(&content);
                            }
                        }
                    }
                }
                Event::End(ref element) => match element.name().as_ref() {
                    b"FileName" | b"Text" => capturing = None,
                    b"Fragment" => {
                        if let (Some(ref mut fragments), Some(done)) =
                            (fragments.as_mut(), fragment.take())
                        {
                            fragments.push(done);
                        }
                    }
                    b"Duplicate" => {
                        if let Some(done) = fragments.take() {
                            self.convert(done, &mut report);
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
            return Err(ParsingError::format(
                factory.id(),
                "input is not a DupFinder report",
            ));
        }
        debug!("DupFinder: {} findings from {}", report.len(), factory.id());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::reader::StringReaderFactory;

    const CODE_FRAGMENT: &str = r#"if (items == null) throw new ArgumentNullException("items");"#;

    fn report_with_source() -> String {
        format!(
            r#"<DuplicatesReport ToolsVersion="1.2">
  <Duplicates>
    <Duplicate Cost="86">
      <Fragment>
        <FileName>test\Publisher.cs</FileName>
        <LineRange Start="12" End="23"/>
        <Text>{CODE_FRAGMENT}</Text>
      </Fragment>
      <Fragment>
        <FileName>test\Reporter.cs</FileName>
        <LineRange Start="26" End="37"/>
        <Text>{CODE_FRAGMENT}</Text>
      </Fragment>
    </Duplicate>
  </Duplicates>
</DuplicatesReport>"#
        )
    }

    fn parse(parser: &DupFinderParser, content: &str) -> Report {
        parser
            .parse(&StringReaderFactory::new("dupfinder.xml", content))
            .unwrap()
    }

    #[test]
    fn links_fragments_through_one_group() {
        let report = parse(&DupFinderParser::with_thresholds(50, 25), &report_with_source());

        assert_eq!(report.len(), 2);

        let publisher = report.get(0);
        let reporter = report.get(1);

        assert_eq!(publisher.file_name(), "test/Publisher.cs");
        assert_eq!(publisher.line_start(), 12);
        assert_eq!(publisher.line_end(), 23);
        assert_eq!(publisher.severity(), Severity::Low);
        assert_eq!(reporter.file_name(), "test/Reporter.cs");
        assert_eq!(reporter.line_start(), 26);
        assert_eq!(reporter.line_end(), 37);

        let group: Arc<DuplicationGroup> = publisher.additional_properties().get().unwrap();
        let other: Arc<DuplicationGroup> = reporter.additional_properties().get().unwrap();
        assert!(Arc::ptr_eq(&group, &other));
        assert_eq!(group.code_fragment(), CODE_FRAGMENT);

        // Each fragment records where its siblings are.
        assert_eq!(publisher.secondary_ranges(), &[LineRange::new(26, 37)]);
        assert_eq!(reporter.secondary_ranges(), &[LineRange::new(12, 23)]);
    }

    #[test]
    fn missing_source_text_leaves_the_group_empty() {
        let content = r#"<DuplicatesReport>
  <Duplicates>
    <Duplicate Cost="10">
      <Fragment><FileName>a.cs</FileName><LineRange Start="1" End="4"/></Fragment>
      <Fragment><FileName>b.cs</FileName><LineRange Start="9" End="12"/></Fragment>
    </Duplicate>
  </Duplicates>
</DuplicatesReport>"#;
        let report = parse(&DupFinderParser::new(), content);

        assert_eq!(report.len(), 2);
        let group: Arc<DuplicationGroup> = report.get(0).additional_properties().get().unwrap();
        assert_eq!(group.code_fragment(), "");
        assert!(report.get(0).description().is_empty());
    }

    #[test]
    fn assigns_severity_by_duplicated_line_count() {
        // 12 duplicated lines in the fixture.
        let cases = [
            (12, 5, Severity::High),
            (13, 5, Severity::Normal),
            (100, 12, Severity::Normal),
            (100, 13, Severity::Low),
        ];
        for (high, normal, expected) in cases {
            let report = parse(
                &DupFinderParser::with_thresholds(high, normal),
                &report_with_source(),
            );
            assert_eq!(report.get(0).severity(), expected, "thresholds {high}/{normal}");
        }
    }

    #[test]
    fn rejects_other_xml_documents() {
        let parser = DupFinderParser::new();
        let result = parser.parse(&StringReaderFactory::new("other.xml", "<pmd></pmd>"));
        assert!(matches!(result, Err(ParsingError::Format { .. })));
    }
}
