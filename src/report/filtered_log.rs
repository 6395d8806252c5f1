use super::collection::Report;

/// Caps the diagnostics recorded by one pass over a report.
///
/// Stores up to `max_lines` lines per channel; everything past the cap is
/// counted but discarded, and `log_summary` turns the count into a single
/// trailing line. Lines reach the report's channels on `flush_to`.
#[derive(Debug)]
pub struct FilteredLog {
    title: String,
    max_lines: usize,
    error_lines: Vec<String>,
    info_lines: Vec<String>,
    error_total: usize,
    info_total: usize,
    summary: Option<String>,
}

impl FilteredLog {
    pub const DEFAULT_MAX_LINES: usize = 20;

    pub fn new(title: impl Into<String>, max_lines: usize) -> Self {
        FilteredLog {
            title: title.into(),
            max_lines,
            error_lines: Vec::new(),
            info_lines: Vec::new(),
            error_total: 0,
            info_total: 0,
            summary: None,
        }
    }

    /// Record one error line. Past the cap only the counter moves.
    pub fn log_error(&mut self, message: impl Into<String>) {
        self.error_total += 1;
        if self.error_lines.len() < self.max_lines {
            self.error_lines.push(message.into());
        }
    }

    /// Record one info line, subject to the same cap as errors.
    pub fn log_info(&mut self, message: impl Into<String>) {
        self.info_total += 1;
        if self.info_lines.len() < self.max_lines {
            self.info_lines.push(message.into());
        }
    }

    /// Record an error with its message and cause chain, one line each,
    /// still subject to the cap.
    pub fn log_exception(&mut self, error: &dyn std::error::Error, message: impl Into<String>) {
        self.log_error(message);
        self.log_error(format!("  {error}"));
        let mut source = error.source();
        while let Some(cause) = source {
            self.log_error(format!("  caused by: {cause}"));
            source = cause.source();
        }
    }

    /// Turn the suppressed-error count into one summary line. Later calls
    /// never add a second line.
    pub fn log_summary(&mut self) {
        let skipped = self.error_total.saturating_sub(self.max_lines);
        if skipped > 0 && self.summary.is_none() {
            self.summary = Some(format!(
                "  ... skipped logging of {skipped} additional errors ..."
            ));
        }
    }

    /// Total number of log attempts, including suppressed ones.
    pub fn size(&self) -> usize {
        self.error_total + self.info_total
    }

    pub fn error_messages(&self) -> &[String] {
        &self.error_lines
    }

    pub fn info_messages(&self) -> &[String] {
        &self.info_lines
    }

    /// Move everything into the report's channels. The title precedes the
    /// error lines and is omitted when there is nothing to say.
    pub fn flush_to(self, report: &mut Report) {
        for line in self.info_lines {
            report.log_info(line);
        }
        if self.error_lines.is_empty() && self.summary.is_none() {
            return;
        }
        report.log_error(self.title);
        for line in self.error_lines {
            report.log_error(line);
        }
        if let Some(summary) = self.summary {
            report.log_error(summary);
        }
    }
}
