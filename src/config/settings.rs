//! User settings for mikla
//!
//! An optional `config.json` holds the user's defaults. It is read once at
//! startup and merged with environment and command-line values into a
//! [`Config`] that the edit session receives by argument.

use std::path::PathBuf;

use serde::Deserialize;

use super::paths::MiklaPaths;
use crate::error::MiklaError;

/// Conventional memory-backed mount point on Linux
pub const DEFAULT_TMPFS: &str = "/dev/shm";

/// Encryption tool looked up on `PATH` when nothing else is configured
pub const DEFAULT_GPG_PROGRAM: &str = "gpg";

/// Persisted defaults, every field optional in the file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Editor command, used when neither `--editor` nor `$EDITOR` is given
    #[serde(default)]
    pub editor: Option<String>,

    /// Volatile directory the plaintext is written to
    #[serde(default = "default_tmpfs")]
    pub tmpfs: PathBuf,

    /// Encryption tool program name or path
    #[serde(default = "default_gpg_program")]
    pub gpg_program: String,

    /// Write ASCII-armored ciphertext
    #[serde(default = "default_armor")]
    pub armor: bool,
}

fn default_tmpfs() -> PathBuf {
    PathBuf::from(DEFAULT_TMPFS)
}

fn default_gpg_program() -> String {
    DEFAULT_GPG_PROGRAM.to_string()
}

fn default_armor() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            editor: None,
            tmpfs: default_tmpfs(),
            gpg_program: default_gpg_program(),
            armor: default_armor(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or fall back to defaults if there is no file
    pub fn load_or_default(paths: &MiklaPaths) -> Result<Self, MiklaError> {
        let Some(settings_path) = paths.settings_file() else {
            return Ok(Settings::default());
        };

        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
            MiklaError::Io(format!(
                "Failed to read settings file {}: {}",
                settings_path.display(),
                e
            ))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            MiklaError::Config(format!(
                "Failed to parse settings file {}: {}",
                settings_path.display(),
                e
            ))
        })
    }

    /// Merge command-line and environment values on top of these settings
    pub fn resolve(self, overrides: Overrides) -> Result<Config, MiklaError> {
        let editor = overrides
            .editor
            .filter(|e| !e.trim().is_empty())
            .or(self.editor)
            .ok_or_else(|| {
                MiklaError::Config(
                    "no editor configured. Set $EDITOR or pass --editor".into(),
                )
            })?;

        Ok(Config {
            editor,
            tmpfs: overrides.tmpfs.unwrap_or(self.tmpfs),
            gpg_program: overrides.gpg_program.unwrap_or(self.gpg_program),
            armor: self.armor && !overrides.no_armor,
        })
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub editor: Option<String>,
    pub tmpfs: Option<PathBuf>,
    pub gpg_program: Option<String>,
    pub no_armor: bool,
}

/// Fully resolved configuration for one edit session
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Editor command line; the plaintext path is appended as the last argument
    pub editor: String,
    /// Volatile directory for the plaintext file
    pub tmpfs: PathBuf,
    /// Encryption tool program name or path
    pub gpg_program: String,
    /// Write ASCII-armored ciphertext
    pub armor: bool,
}
