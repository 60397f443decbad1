//! Custom error types for mikla
//!
//! Every failure an edit session can hit is terminal for the run, so a single
//! flat enum covers them all. The binary prints the `Display` form and exits 1.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// The main error type for mikla operations
#[derive(Error, Debug)]
pub enum MiklaError {
    /// The encryption tool could not be resolved to an executable
    #[error("{tool} not found. Is it installed and on your PATH?")]
    ToolNotFound { tool: String },

    /// The encrypted file does not exist
    #[error("{} not found{}", .path.display(), backup_hint(.backup.as_deref()))]
    FileNotFound {
        path: PathBuf,
        /// A backup left behind by an interrupted run, if one exists
        backup: Option<PathBuf>,
    },

    /// The encrypted file exists but cannot be opened for reading
    #[error("{} is not readable", .path.display())]
    FileNotReadable { path: PathBuf },

    /// The volatile directory does not accept new files
    #[error("{} is not writable", .path.display())]
    DirectoryNotWritable { path: PathBuf },

    /// The encryption tool refused to decrypt
    #[error("Decryption of {} failed. Wrong password?", .path.display())]
    DecryptionFailed { path: PathBuf },

    /// The encryption tool refused to encrypt; the original was restored
    #[error("Encryption of {} failed. The original file has been restored.", .path.display())]
    EncryptionFailed { path: PathBuf },

    /// A backup from an earlier, interrupted session would be overwritten
    #[error(
        "Backup {} already exists. Recover or remove it before editing again.",
        .path.display()
    )]
    BackupExists { path: PathBuf },

    /// Another edit session holds the lock for this file
    #[error("{} is already being edited in another session", .path.display())]
    SessionLocked { path: PathBuf },

    /// The editor could not be started
    #[error("Editor error: {0}")]
    EditorFailed(String),

    /// The password could not be read from the terminal
    #[error("Failed to read password: {0}")]
    PasswordInput(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

fn backup_hint(backup: Option<&Path>) -> String {
    match backup {
        Some(bak) => format!(" (a backup from an interrupted session exists at {})", bak.display()),
        None => String::new(),
    }
}

impl MiklaError {
    /// Create a "not found" error for an encrypted file, noting any leftover backup
    pub fn file_not_found(path: impl Into<PathBuf>, backup: Option<PathBuf>) -> Self {
        Self::FileNotFound {
            path: path.into(),
            backup,
        }
    }
}

impl From<std::io::Error> for MiklaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for mikla operations
pub type MiklaResult<T> = Result<T, MiklaError>;
