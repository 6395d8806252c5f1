use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::encoding::Encoding;

/// Engine configuration (loaded from `.lintrail.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub fingerprint: FingerprintConfig,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Lines hashed before and after a finding's start line.
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Error lines kept per pass before the log starts counting instead.
    #[serde(default = "default_max_log_lines")]
    pub max_log_lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InputConfig {
    /// Encoding of the affected source files, unless a reader knows better.
    #[serde(default)]
    pub encoding: Encoding,
}

fn default_context_lines() -> usize {
    crate::fingerprint::FullTextFingerprint::DEFAULT_CONTEXT
}

fn default_max_log_lines() -> usize {
    crate::report::FilteredLog::DEFAULT_MAX_LINES
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        FingerprintConfig {
            context_lines: default_context_lines(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        DiagnosticsConfig {
            max_log_lines: default_max_log_lines(),
        }
    }
}

impl EngineConfig {
    /// Try to load `.lintrail.toml` from the given directory or its parents.
    pub fn load(start: &Path) -> Option<Self> {
        let config_path = find_config_file(start)?;
        debug!("Found config: {}", config_path.display());

        match std::fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str::<EngineConfig>(&content) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    Some(config)
                }
                Err(error) => {
                    tracing::warn!("Failed to parse {}: {error}", config_path.display());
                    None
                }
            },
            Err(error) => {
                debug!("Could not read {}: {error}", config_path.display());
                None
            }
        }
    }

    /// Load from the given directory, falling back to the defaults.
    pub fn load_or_default(start: &Path) -> Self {
        Self::load(start).unwrap_or_default()
    }
}

/// Walk up from the start path to find `.lintrail.toml`.
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let config = current.join(".lintrail.toml");
        if config.exists() {
            return Some(config);
        }
        if !current.pop() {
            return None;
        }
    }
}
