use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::encoding::Encoding;

/// Why a source file could not be read for fingerprinting. The classes are
/// distinguished for diagnostics only; every one of them leads to the same
/// fallback.
#[derive(Debug, Error)]
pub enum FileReadError {
    #[error("'{0}' file not found")]
    NotFound(String),
    #[error("'{path}' cannot be decoded as {encoding}")]
    Encoding { path: String, encoding: Encoding },
    #[error("'{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Line-level file access used by the fingerprint engine. A trait seam so
/// tests can substitute in-memory content for real files.
pub trait FileSystem: Send + Sync {
    fn read_lines(&self, file_name: &str, encoding: Encoding) -> Result<Vec<String>, FileReadError>;
}

/// Reads source files from the operating system.
#[derive(Debug, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_lines(&self, file_name: &str, encoding: Encoding) -> Result<Vec<String>, FileReadError> {
        let bytes = std::fs::read(Path::new(file_name)).map_err(|error| match error.kind() {
            io::ErrorKind::NotFound => FileReadError::NotFound(file_name.to_owned()),
            _ => FileReadError::Io {
                path: file_name.to_owned(),
                source: error,
            },
        })?;
        let text = encoding.decode(&bytes).map_err(|_| FileReadError::Encoding {
            path: file_name.to_owned(),
            encoding,
        })?;
        Ok(text.lines().map(str::to_owned).collect())
    }
}

/// Computes a content-derived identity for a finding.
///
/// Hashes a normalized window of lines around the finding's start line, so
/// the identity survives edits elsewhere in the file as well as pure
/// reformatting inside the window, while any other change inside the window
/// produces a new identity.
pub struct FullTextFingerprint {
    context: usize,
    file_system: Box<dyn FileSystem>,
    cache: HashMap<String, Arc<Vec<String>>>,
}

impl FullTextFingerprint {
    /// Lines taken before and after the target line.
    pub const DEFAULT_CONTEXT: usize = 3;

    pub fn new() -> Self {
        Self::with_context(Self::DEFAULT_CONTEXT)
    }

    pub fn with_context(context: usize) -> Self {
        Self::with_file_system(context, Box::new(OsFileSystem))
    }

    pub fn with_file_system(context: usize, file_system: Box<dyn FileSystem>) -> Self {
        FullTextFingerprint {
            context,
            file_system,
            cache: HashMap::new(),
        }
    }

    /// Fingerprint the given location. The lines of each distinct file are
    /// read once and cached for the lifetime of this instance.
    pub fn compute(
        &mut self,
        file_name: &str,
        line: usize,
        encoding: Encoding,
    ) -> Result<String, FileReadError> {
        let lines = match self.cache.get(file_name) {
            Some(lines) => Arc::clone(lines),
            None => {
                debug!("Reading {file_name} for fingerprinting");
                let lines = Arc::new(self.file_system.read_lines(file_name, encoding)?);
                self.cache.insert(file_name.to_owned(), Arc::clone(&lines));
                lines
            }
        };
        Ok(digest(&extract_context(&lines, line, self.context)))
    }
}

impl Default for FullTextFingerprint {
    fn default() -> Self {
        Self::new()
    }
}

/// The window around `line`, clipped at the file boundaries, with all
/// whitespace removed so reformatting does not change the result.
fn extract_context(lines: &[String], line: usize, context: usize) -> String {
    // Line numbers are 1-based; 0 means unknown and anchors at the top.
    let focus = line.max(1) - 1;
    let start = focus.saturating_sub(context);
    let end = lines.len().min(focus.saturating_add(context) + 1);
    let mut normalized = String::new();
    for line in lines.iter().take(end).skip(start) {
        normalized.extend(line.chars().filter(|c| !c.is_whitespace()));
    }
    normalized
}

fn digest(context: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(context.as_bytes());
    hex::encode(hasher.finalize())
}
