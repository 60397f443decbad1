//! The plaintext file in the volatile directory
//!
//! Its name is a fresh v4 UUID. [`PlaintextFile`] owns the path for the rest
//! of the session and deletes the file when dropped, so every exit path after
//! decryption cleans up.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{MiklaError, MiklaResult};

/// Pick `dir/<uuid>` with nothing currently at that path
///
/// Does not create the file.
pub fn unique_path(dir: &Path) -> PathBuf {
    unique_path_with(dir, || Uuid::new_v4().to_string())
}

/// Like [`unique_path`], drawing candidate names from `next_id`
///
/// Colliding candidates are skipped; the first free one is returned.
pub fn unique_path_with<F>(dir: &Path, mut next_id: F) -> PathBuf
where
    F: FnMut() -> String,
{
    loop {
        let candidate = dir.join(next_id());
        // symlink_metadata so a dangling symlink still counts as taken
        if fs::symlink_metadata(&candidate).is_err() {
            return candidate;
        }
        debug!(path = %candidate.display(), "candidate path taken, retrying");
    }
}

/// Decrypted content on volatile storage, deleted on drop
#[derive(Debug)]
pub struct PlaintextFile {
    path: PathBuf,
    removed: bool,
}

impl PlaintextFile {
    /// Claim a fresh path in `dir` and create it empty, readable by the owner only
    pub fn create_in(dir: &Path) -> MiklaResult<Self> {
        loop {
            let path = unique_path(dir);
            match open_private(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "created plaintext file");
                    return Ok(Self {
                        path,
                        removed: false,
                    });
                }
                // Lost a race for the name; draw another
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(MiklaError::Io(format!(
                        "Failed to create plaintext file in {}: {}",
                        dir.display(),
                        e
                    )))
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, reporting failure
    pub fn remove(mut self) -> MiklaResult<()> {
        self.removed = true;
        remove_if_present(&self.path).map_err(|e| {
            MiklaError::Io(format!(
                "Failed to delete plaintext file {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl Drop for PlaintextFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = remove_if_present(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to delete plaintext file");
        }
    }
}

fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
        .map(drop)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<()> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map(drop)
}
