use std::sync::OnceLock;

/// Shared description of one detected code duplication.
///
/// Every finding that takes part in the duplication references the same
/// group through its additional properties; the group never references the
/// findings or the report back. The duplicated fragment is attached once,
/// by whichever fragment carries it.
#[derive(Debug, Default)]
pub struct DuplicationGroup {
    code_fragment: OnceLock<String>,
}

impl DuplicationGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the duplicated source fragment. Later calls are ignored.
    pub fn set_code_fragment(&self, fragment: impl Into<String>) {
        let _ = self.code_fragment.set(fragment.into());
    }

    pub fn code_fragment(&self) -> &str {
        self.code_fragment
            .get()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn fragment_is_write_once() {
        let group = DuplicationGroup::new();
        assert_eq!(group.code_fragment(), "");

        group.set_code_fragment("let x = 1;");
        group.set_code_fragment("ignored");

        assert_eq!(group.code_fragment(), "let x = 1;");
    }

    #[test]
    fn group_is_shared_by_reference() {
        let group = Arc::new(DuplicationGroup::new());
        let other = Arc::clone(&group);
        group.set_code_fragment("shared");

        assert_eq!(other.code_fragment(), "shared");
    }
}
