//! Path management for mikla
//!
//! ## Path Resolution Order
//!
//! 1. `MIKLA_CONFIG_DIR` environment variable (if set)
//! 2. The platform config directory: `$XDG_CONFIG_HOME/mikla` or `~/.config/mikla`
//!    on Unix, `%APPDATA%\mikla\config` on Windows
//! 3. None: without a home directory there is no settings file and the
//!    built-in defaults apply

use std::path::PathBuf;

use directories::ProjectDirs;
use tracing::debug;

/// Locates the files mikla reads its defaults from
#[derive(Debug, Clone)]
pub struct MiklaPaths {
    /// Base directory for mikla configuration, if one could be determined
    base_dir: Option<PathBuf>,
}

impl MiklaPaths {
    /// Resolve the configuration directory from the environment
    pub fn new() -> Self {
        let base_dir = match std::env::var_os("MIKLA_CONFIG_DIR") {
            Some(custom) => Some(PathBuf::from(custom)),
            None => ProjectDirs::from("", "", "mikla").map(|dirs| dirs.config_dir().to_path_buf()),
        };

        if base_dir.is_none() {
            debug!("no home directory; using built-in defaults");
        }

        Self { base_dir }
    }

    /// Create MiklaPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            base_dir: Some(base_dir),
        }
    }

    #[cfg(test)]
    pub(crate) fn unresolved() -> Self {
        Self { base_dir: None }
    }

    /// Get the path to the settings file, if there is a config directory
    pub fn settings_file(&self) -> Option<PathBuf> {
        self.base_dir.as_ref().map(|dir| dir.join("config.json"))
    }
}

impl Default for MiklaPaths {
    fn default() -> Self {
        Self::new()
    }
}
