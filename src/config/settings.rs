//! Semantic triage settings.
//!
//! Settings are persisted to `settings.json` in the user's config directory
//! (XDG on Linux) and loaded at startup.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embedding::ModelType;
use crate::triage::DEFAULT_TOP_K;

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Configuration for semantic folder suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageSettings {
    /// Whether folder suggestions are produced at all.
    pub enabled: bool,
    /// Embedding model used for indexing and search.
    pub model: ModelType,
    /// Number of neighbors that vote on a folder.
    pub top_k: usize,
    /// Suggestions below this confidence are discarded (0.0 to 1.0).
    pub min_confidence: f32,
    /// Local directory with transformer weights. Downloads from the hub when unset.
    pub model_dir: Option<PathBuf>,
}

impl Default for TriageSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: ModelType::default(),
            top_k: DEFAULT_TOP_K,
            min_confidence: 0.0,
            model_dir: None,
        }
    }
}

impl TriageSettings {
    /// Default location of the settings file, if a home directory exists.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "panbanda", "margin")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Loads settings from `path`, falling back to defaults when the file
    /// does not exist. Missing fields take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Writes settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
