//! Advisory lock against two sessions editing the same file
//!
//! The encrypted file itself is opened read-only and locked exclusively with
//! `flock`. The kernel releases the lock when the descriptor closes, including
//! when the process is killed, so an aborted session never leaves a stale lock
//! behind. No extra file is created, so a read-only directory still works for
//! sessions that end without changes.
//!
//! The lock follows the inode opened at session start. Re-encryption replaces
//! the file, so a session started during that short window is not excluded.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fd_lock::{RwLock, RwLockWriteGuard};
use tracing::debug;

use crate::error::{MiklaError, MiklaResult};

/// The encrypted file, opened for locking
pub struct SessionLock {
    path: PathBuf,
    file: RwLock<File>,
}

impl SessionLock {
    /// Open `encrypted` for locking; does not take the lock yet
    pub fn open(encrypted: &Path) -> MiklaResult<Self> {
        let file = File::open(encrypted).map_err(|e| {
            MiklaError::Io(format!(
                "Failed to open {} for locking: {}",
                encrypted.display(),
                e
            ))
        })?;

        Ok(Self {
            path: encrypted.to_path_buf(),
            file: RwLock::new(file),
        })
    }

    /// Take the exclusive lock, failing at once if another session holds it
    ///
    /// The lock is held until the returned guard is dropped or the process exits.
    pub fn try_acquire(&mut self) -> MiklaResult<RwLockWriteGuard<'_, File>> {
        match self.file.try_write() {
            Ok(guard) => {
                debug!(path = %self.path.display(), "acquired session lock");
                Ok(guard)
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(MiklaError::SessionLocked {
                path: self.path.clone(),
            }),
            Err(e) => Err(MiklaError::Io(format!(
                "Failed to lock {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn ciphertext(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("notes.gpg");
        fs::write(&path, "-----BEGIN PGP MESSAGE-----").unwrap();
        path
    }

    #[test]
    fn test_acquire_and_release() {
        let temp_dir = TempDir::new().unwrap();
        let encrypted = ciphertext(&temp_dir);

        let mut first = SessionLock::open(&encrypted).unwrap();
        drop(first.try_acquire().unwrap());

        let mut second = SessionLock::open(&encrypted).unwrap();
        assert!(second.try_acquire().is_ok());
    }

    #[test]
    fn test_second_acquire_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let encrypted = ciphertext(&temp_dir);

        let mut first = SessionLock::open(&encrypted).unwrap();
        let _held = first.try_acquire().unwrap();

        let mut second = SessionLock::open(&encrypted).unwrap();
        let err = second.try_acquire().err().unwrap();

        assert!(matches!(err, MiklaError::SessionLocked { .. }));
        assert!(err.to_string().contains("notes.gpg"));
    }

    #[test]
    fn test_dead_holder_does_not_block() {
        let temp_dir = TempDir::new().unwrap();
        let encrypted = ciphertext(&temp_dir);

        // A killed process never runs the guard's Drop; only its descriptor closes.
        let mut holder = SessionLock::open(&encrypted).unwrap();
        std::mem::forget(holder.try_acquire().unwrap());
        drop(holder);

        let mut next = SessionLock::open(&encrypted).unwrap();
        assert!(next.try_acquire().is_ok());
    }

    #[test]
    fn test_leaves_no_files_behind() {
        let temp_dir = TempDir::new().unwrap();
        let encrypted = ciphertext(&temp_dir);

        let mut lock = SessionLock::open(&encrypted).unwrap();
        let _held = lock.try_acquire().unwrap();

        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_directory() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let encrypted = ciphertext(&temp_dir);
        fs::set_permissions(temp_dir.path(), fs::Permissions::from_mode(0o555)).unwrap();

        let mut lock = SessionLock::open(&encrypted).unwrap();
        let acquired = lock.try_acquire().is_ok();

        fs::set_permissions(temp_dir.path(), fs::Permissions::from_mode(0o755)).unwrap();
        assert!(acquired);
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = SessionLock::open(&temp_dir.path().join("gone.gpg")).err().unwrap();
        assert!(matches!(err, MiklaError::Io(_)));
    }
}
