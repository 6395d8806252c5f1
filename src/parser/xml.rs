use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Create an event reader hardened for untrusted tool output.
///
/// External entities, external DTD subsets and external parameter entities
/// are never resolved: `quick_xml` performs no entity or DTD resolution at
/// all, and every XML adapter in this crate must obtain its reader here so
/// that guarantee lives in one place.
pub fn secure_reader(content: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(content);
    let config = reader.config_mut();
    config.trim_text(true);
    config.expand_empty_elements = false;
    reader
}

/// Collect the attributes of an element into a map.
pub fn attributes(element: &BytesStart<'_>) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for attribute in element.attributes().flatten() {
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map(|value| value.into_owned())
            .unwrap_or_default();
        attrs.insert(key, value);
    }
    attrs
}

/// Attribute parsed as a number; missing or malformed values become 0
/// ("unknown").
pub fn numeric(attrs: &HashMap<String, String>, key: &str) -> usize {
    attrs
        .get(key)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Text content of the first `name` element directly below the document
/// root, e.g. the `artifactId` of a Maven pom. Deeper occurrences (such as
/// the one inside `parent`) do not count.
pub fn direct_child_text(content: &str, name: &str) -> Option<String> {
    let mut reader = secure_reader(content);
    let mut depth = 0usize;
    let mut capture = false;
    let mut buffer = Vec::new();
    loop {
        match reader.read_event_into(&mut buffer) {
            Ok(Event::Start(element)) => {
                depth += 1;
                capture = depth == 2 && element.name().as_ref() == name.as_bytes();
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                capture = false;
            }
            Ok(Event::Text(text)) if capture => {
                return text
                    .unescape()
                    .ok()
                    .map(|text| text.trim().to_owned())
                    .filter(|text| !text.is_empty());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buffer.clear();
    }
}
