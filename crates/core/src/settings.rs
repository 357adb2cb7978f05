//! Snippet-runner settings.
//!
//! The runner remembers the last snippet, its wrapped `.c` file, and the
//! compiled binary so `--last`, `--editlast`, and `--lastbinary` work
//! across runs. The state lives in one JSON file with explicit load/save
//! calls at the process boundaries; nothing here is global.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Cannot read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Settings JSON error for {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Cannot write settings file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persisted snippet-runner state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// The raw (unwrapped) text of the last compiled snippet.
    #[serde(default)]
    pub last_snippet: Option<String>,
    /// The wrapped `.c` file the last snippet compiled from.
    #[serde(default)]
    pub last_c_file: Option<String>,
    /// The last compiled binary.
    #[serde(default)]
    pub last_binary: Option<String>,
    /// Preferred editor for `--editlast`; `$EDITOR` wins when unset.
    #[serde(default)]
    pub editor: Option<String>,
}

impl Settings {
    /// Load settings from `path`. A missing file yields defaults; a
    /// malformed file is an error so a typo does not silently wipe state.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(body) => serde_json::from_str(&body)
                .map_err(|e| SettingsError::Json { path: path.to_path_buf(), source: e }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(SettingsError::Read { path: path.to_path_buf(), source: e }),
        }
    }

    /// Write settings to `path`, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::Write { path: path.to_path_buf(), source: e })?;
        }
        let body = serde_json::to_string_pretty(self)
            .map_err(|e| SettingsError::Json { path: path.to_path_buf(), source: e })?;
        std::fs::write(path, body)
            .map_err(|e| SettingsError::Write { path: path.to_path_buf(), source: e })
    }

    /// The editor to launch for `--editlast`: explicit setting, then
    /// `$EDITOR`, then vim.
    pub fn resolve_editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "vim".to_string())
    }
}
