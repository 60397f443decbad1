//! GnuPG as the symmetric encryption tool
//!
//! The password is written to the child's stdin and read by GnuPG through
//! `--passphrase-fd 0`, so it never shows up in the process table. Only the
//! exit status is inspected; GnuPG's stderr goes straight to the terminal.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use super::ToolStatus;
use crate::crypto::Passphrase;
use crate::error::{MiklaError, MiklaResult};

/// Symmetric encryption engine invoked per operation
pub trait CipherTool {
    /// Program name or path, as checked by preflight
    fn program(&self) -> &str;

    /// Decrypt `encrypted` into `output`
    fn decrypt(
        &self,
        passphrase: &Passphrase,
        encrypted: &Path,
        output: &Path,
    ) -> MiklaResult<ToolStatus>;

    /// Encrypt `plaintext` into `output`, replacing whatever is there
    fn encrypt(
        &self,
        passphrase: &Passphrase,
        plaintext: &Path,
        output: &Path,
    ) -> MiklaResult<ToolStatus>;
}

/// GnuPG driven in batch mode
#[derive(Debug, Clone)]
pub struct Gpg {
    program: String,
    armor: bool,
}

impl Gpg {
    /// Create a driver for `program`, a bare name or a path
    pub fn new(program: impl Into<String>, armor: bool) -> Self {
        Self {
            program: program.into(),
            armor,
        }
    }

    /// Options shared by both directions: no TTY interaction, password on fd 0
    fn batch_args() -> Vec<OsString> {
        [
            "--batch",
            "--yes",
            "--quiet",
            "--pinentry-mode",
            "loopback",
            "--passphrase-fd",
            "0",
        ]
        .iter()
        .map(OsString::from)
        .collect()
    }

    fn decrypt_args(encrypted: &Path, output: &Path) -> Vec<OsString> {
        let mut args = Self::batch_args();
        args.push("--output".into());
        args.push(output.into());
        args.push("--decrypt".into());
        args.push(encrypted.into());
        args
    }

    fn encrypt_args(&self, plaintext: &Path, output: &Path) -> Vec<OsString> {
        let mut args = Self::batch_args();
        if self.armor {
            args.push("--armor".into());
        }
        args.push("--symmetric".into());
        args.push("--output".into());
        args.push(output.into());
        args.push(plaintext.into());
        args
    }

    fn run(&self, args: Vec<OsString>, passphrase: &Passphrase) -> MiklaResult<ToolStatus> {
        debug!(program = %self.program, "running encryption tool");

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                MiklaError::Io(format!(
                    "Failed to start {}: {}",
                    self.program,
                    e
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A tool that exits before reading closes the pipe; its exit
            // status is what gets reported.
            let _ = stdin
                .write_all(passphrase.as_bytes())
                .and_then(|()| stdin.write_all(b"\n"));
        }

        let status = child.wait().map_err(|e| {
            MiklaError::Io(format!(
                "Failed to wait for {}: {}",
                self.program,
                e
            ))
        })?;

        let status = ToolStatus::from(status);
        debug!(?status, "encryption tool finished");
        Ok(status)
    }
}

impl CipherTool for Gpg {
    fn program(&self) -> &str {
        &self.program
    }

    fn decrypt(
        &self,
        passphrase: &Passphrase,
        encrypted: &Path,
        output: &Path,
    ) -> MiklaResult<ToolStatus> {
        self.run(Self::decrypt_args(encrypted, output), passphrase)
    }

    fn encrypt(
        &self,
        passphrase: &Passphrase,
        plaintext: &Path,
        output: &Path,
    ) -> MiklaResult<ToolStatus> {
        self.run(self.encrypt_args(plaintext, output), passphrase)
    }
}

/// Resolve `name` to an executable file
///
/// A name containing a path separator is checked as given; a bare name is
/// searched for in each `PATH` entry.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let search_path = std::env::var_os("PATH")?;
    std::env::split_paths(&search_path)
        .map(|dir| dir.join(name))
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
