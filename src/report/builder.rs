use std::sync::OnceLock;

use uuid::Uuid;

use super::finding::{
    AdditionalProperties, Finding, LineRange, Severity, UNDEFINED_FILE, UNDEFINED_MODULE,
};

/// Accumulates the fields of a finding and creates immutable instances.
///
/// The builder is reusable: `build` snapshots the current state, so one
/// builder can stamp out many findings that share most of their fields.
/// Later mutation never affects previously built findings.
#[derive(Debug, Clone, Default)]
pub struct FindingBuilder {
    file_name: Option<String>,
    line_start: usize,
    line_end: usize,
    column_start: usize,
    column_end: usize,
    secondary_ranges: Vec<LineRange>,
    severity: Option<Severity>,
    category: String,
    kind: String,
    package_name: String,
    module_name: Option<String>,
    origin: String,
    message: String,
    description: String,
    fingerprint: Option<String>,
    additional: AdditionalProperties,
}

impl FindingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the affected file. Backslash separators are normalized to `/`.
    pub fn file_name(&mut self, file_name: impl AsRef<str>) -> &mut Self {
        self.file_name = Some(file_name.as_ref().replace('\\', "/"));
        self
    }

    pub fn line_start(&mut self, line_start: usize) -> &mut Self {
        self.line_start = line_start;
        self
    }

    pub fn line_end(&mut self, line_end: usize) -> &mut Self {
        self.line_end = line_end;
        self
    }

    pub fn column_start(&mut self, column_start: usize) -> &mut Self {
        self.column_start = column_start;
        self
    }

    pub fn column_end(&mut self, column_end: usize) -> &mut Self {
        self.column_end = column_end;
        self
    }

    /// Append a secondary line span; spans already present are not repeated.
    pub fn secondary_range(&mut self, range: LineRange) -> &mut Self {
        if !self.secondary_ranges.contains(&range) {
            self.secondary_ranges.push(range);
        }
        self
    }

    pub fn secondary_ranges(&mut self, ranges: impl IntoIterator<Item = LineRange>) -> &mut Self {
        for range in ranges {
            self.secondary_range(range);
        }
        self
    }

    /// Set the severity. An absent severity (a tool mapping that produced
    /// `None`) falls back to the default instead of failing.
    pub fn severity(&mut self, severity: impl Into<Option<Severity>>) -> &mut Self {
        self.severity = severity.into();
        self
    }

    pub fn category(&mut self, category: impl Into<String>) -> &mut Self {
        self.category = category.into();
        self
    }

    pub fn kind(&mut self, kind: impl Into<String>) -> &mut Self {
        self.kind = kind.into();
        self
    }

    pub fn package_name(&mut self, package_name: impl Into<String>) -> &mut Self {
        self.package_name = package_name.into();
        self
    }

    pub fn module_name(&mut self, module_name: impl Into<String>) -> &mut Self {
        self.module_name = Some(module_name.into());
        self
    }

    pub fn origin(&mut self, origin: impl Into<String>) -> &mut Self {
        self.origin = origin.into();
        self
    }

    pub fn message(&mut self, message: impl Into<String>) -> &mut Self {
        self.message = message.into();
        self
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    pub fn fingerprint(&mut self, fingerprint: impl Into<String>) -> &mut Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn additional_properties(&mut self, additional: AdditionalProperties) -> &mut Self {
        self.additional = additional;
        self
    }

    /// Snapshot the current state into a new finding with a fresh
    /// identifier. The builder stays usable afterwards.
    pub fn build(&self) -> Finding {
        let (line_start, line_end) = normalize_range(self.line_start, self.line_end);
        let (column_start, column_end) = normalize_range(self.column_start, self.column_end);

        let module_name = OnceLock::new();
        if let Some(ref module) = self.module_name {
            if module != UNDEFINED_MODULE && !module.is_empty() {
                let _ = module_name.set(module.clone());
            }
        }

        let fingerprint = OnceLock::new();
        if let Some(ref digest) = self.fingerprint {
            let _ = fingerprint.set(digest.clone());
        }

        Finding {
            id: Uuid::new_v4(),
            file_name: self
                .file_name
                .clone()
                .unwrap_or_else(|| UNDEFINED_FILE.to_owned()),
            line_start,
            line_end,
            column_start,
            column_end,
            secondary_ranges: self.secondary_ranges.clone(),
            severity: self.severity.unwrap_or(Severity::Normal),
            category: self.category.clone(),
            kind: self.kind.clone(),
            package_name: self.package_name.clone(),
            module_name,
            origin: self.origin.clone(),
            message: self.message.trim().to_owned(),
            description: self.description.clone(),
            fingerprint,
            additional: self.additional.clone(),
        }
    }
}

/// An end of 0 means "same as start"; reversed bounds are swapped.
fn normalize_range(start: usize, end: usize) -> (usize, usize) {
    if end == 0 {
        (start, start)
    } else if end < start {
        (end, start)
    } else {
        (start, end)
    }
}
