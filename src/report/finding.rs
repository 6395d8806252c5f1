use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Severity of a finding, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Normal,
    High,
    Error,
}

impl Severity {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "ERROR" => Severity::Error,
            "HIGH" => Severity::High,
            "LOW" => Severity::Low,
            _ => Severity::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::High => "HIGH",
            Severity::Normal => "NORMAL",
            Severity::Low => "LOW",
        }
    }

    pub(crate) const ALL: [Severity; 4] =
        [Severity::Low, Severity::Normal, Severity::High, Severity::Error];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A secondary line span of a finding. Multi-span findings such as code
/// duplications reference every other place the same fragment occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        if end < start {
            LineRange { start: end, end: start }
        } else {
            LineRange { start, end }
        }
    }
}

/// Opaque payload a format adapter may attach to a finding, e.g. the shared
/// link between all fragments of one code duplication.
#[derive(Clone, Default)]
pub struct AdditionalProperties(Option<Arc<dyn Any + Send + Sync>>);

impl AdditionalProperties {
    pub fn new<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        AdditionalProperties(Some(value))
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Downcast the payload to a concrete type.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.0.clone()?.downcast::<T>().ok()
    }
}

impl fmt::Debug for AdditionalProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("AdditionalProperties(set)"),
            None => f.write_str("AdditionalProperties(unset)"),
        }
    }
}

/// Module name of findings no detector could resolve.
pub const UNDEFINED_MODULE: &str = "-";

/// File name of findings that have no location.
pub const UNDEFINED_FILE: &str = "-";

/// One normalized static-analysis finding.
///
/// Immutable after construction except for two late-bound, write-once
/// fields: the fingerprint (assigned by the fingerprint pass) and the
/// module name (assigned by the module resolver when the producing adapter
/// left it unset).
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub(crate) id: Uuid,
    pub(crate) file_name: String,
    pub(crate) line_start: usize,
    pub(crate) line_end: usize,
    pub(crate) column_start: usize,
    pub(crate) column_end: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) secondary_ranges: Vec<LineRange>,
    pub(crate) severity: Severity,
    pub(crate) category: String,
    pub(crate) kind: String,
    pub(crate) package_name: String,
    #[serde(serialize_with = "serialize_module")]
    pub(crate) module_name: OnceLock<String>,
    pub(crate) origin: String,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub(crate) description: String,
    #[serde(serialize_with = "serialize_once")]
    pub(crate) fingerprint: OnceLock<String>,
    #[serde(skip)]
    pub(crate) additional: AdditionalProperties,
}

impl Finding {
    /// Unique identifier assigned at construction.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Absolute file name with forward-slash separators, or `"-"`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File name without its directory part.
    pub fn base_name(&self) -> &str {
        self.file_name
            .rsplit('/')
            .next()
            .unwrap_or(&self.file_name)
    }

    pub fn has_file_name(&self) -> bool {
        self.file_name != UNDEFINED_FILE && !self.file_name.is_empty()
    }

    /// First affected line, 1-based. 0 means the location is unknown.
    pub fn line_start(&self) -> usize {
        self.line_start
    }

    pub fn line_end(&self) -> usize {
        self.line_end
    }

    pub fn column_start(&self) -> usize {
        self.column_start
    }

    pub fn column_end(&self) -> usize {
        self.column_end
    }

    /// Additional line spans of a multi-span finding, in insertion order.
    pub fn secondary_ranges(&self) -> &[LineRange] {
        &self.secondary_ranges
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Tool-specific type, e.g. the rule that produced the finding.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Logical module the affected file belongs to, or `"-"`.
    pub fn module_name(&self) -> &str {
        self.module_name
            .get()
            .map(String::as_str)
            .unwrap_or(UNDEFINED_MODULE)
    }

    pub fn has_module_name(&self) -> bool {
        matches!(self.module_name.get(), Some(name) if name != UNDEFINED_MODULE)
    }

    /// Assign the module name. A name that is already set is never replaced.
    pub fn set_module_name(&self, module_name: impl Into<String>) {
        let _ = self.module_name.set(module_name.into());
    }

    /// Identifier of the tool that produced this finding.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Detailed description, may contain markup.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.get().map(String::as_str)
    }

    pub fn has_fingerprint(&self) -> bool {
        self.fingerprint.get().is_some()
    }

    /// Assign the content fingerprint. Immutable once set: later calls are
    /// ignored.
    pub fn set_fingerprint(&self, fingerprint: impl Into<String>) {
        let _ = self.fingerprint.set(fingerprint.into());
    }

    pub fn additional_properties(&self) -> &AdditionalProperties {
        &self.additional
    }

    /// Whether another finding reports the same content. Used by the report
    /// to drop duplicates; fingerprint and identifier do not take part.
    pub fn is_content_duplicate_of(&self, other: &Finding) -> bool {
        self.file_name == other.file_name
            && self.line_start == other.line_start
            && self.line_end == other.line_end
            && self.category == other.category
            && self.kind == other.kind
            && self.message == other.message
            && self.package_name == other.package_name
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{}): {}: {}: {}",
            self.base_name(),
            self.line_start,
            self.column_start,
            self.severity,
            self.category,
            self.message
        )
    }
}

fn serialize_once<S: Serializer>(value: &OnceLock<String>, serializer: S) -> Result<S::Ok, S::Error> {
    value.get().serialize(serializer)
}

fn serialize_module<S: Serializer>(value: &OnceLock<String>, serializer: S) -> Result<S::Ok, S::Error> {
    value
        .get()
        .map(String::as_str)
        .unwrap_or(UNDEFINED_MODULE)
        .serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_is_totally_ordered() {
        assert!(Severity::Error > Severity::High);
        assert!(Severity::High > Severity::Normal);
        assert!(Severity::Normal > Severity::Low);
    }

    #[test]
    fn line_range_swaps_reversed_bounds() {
        assert_eq!(LineRange::new(9, 4), LineRange::new(4, 9));
    }

    #[test]
    fn additional_properties_downcast() {
        let payload = Arc::new(String::from("fragment"));
        let properties = AdditionalProperties::new(Arc::clone(&payload));

        assert!(properties.is_set());
        let read: Arc<String> = properties.get().unwrap();
        assert!(Arc::ptr_eq(&read, &payload));
        assert!(properties.get::<usize>().is_none());
    }
}
