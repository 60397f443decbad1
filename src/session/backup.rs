//! Re-encryption with backup and rollback
//!
//! The order is fixed:
//!
//! 1. rename `<file>` to `<file>.bak`, refusing if a backup is already there
//! 2. encrypt the plaintext straight to `<file>`
//! 3. on success delete the backup
//! 4. on failure drop any partial output and rename the backup back
//!
//! A handled failure therefore always leaves the original ciphertext at its
//! own path. Only an interruption between steps 1 and 4 can leave it under the
//! backup name, which preflight reports on the next run.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::crypto::Passphrase;
use crate::error::{MiklaError, MiklaResult};
use crate::tools::CipherTool;

/// `<encrypted>.bak`, next to the encrypted file
pub fn backup_path(encrypted: &Path) -> PathBuf {
    let mut name = OsString::from(encrypted.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

/// Fail with [`MiklaError::BackupExists`] if `<encrypted>.bak` is present
///
/// A leftover backup is the only copy of the original after an interrupted
/// session, so it must never be overwritten.
pub fn ensure_no_backup(encrypted: &Path) -> MiklaResult<()> {
    let backup = backup_path(encrypted);
    match fs::symlink_metadata(&backup) {
        Ok(_) => Err(MiklaError::BackupExists { path: backup }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MiklaError::Io(format!(
            "Failed to check for {}: {}",
            backup.display(),
            e
        ))),
    }
}

/// Replace `encrypted` with a fresh encryption of `plaintext`
pub fn reencrypt_with_backup<C>(
    tool: &C,
    passphrase: &Passphrase,
    plaintext: &Path,
    encrypted: &Path,
) -> MiklaResult<()>
where
    C: CipherTool + ?Sized,
{
    ensure_no_backup(encrypted)?;
    let backup = backup_path(encrypted);

    fs::rename(encrypted, &backup).map_err(|e| {
        MiklaError::Io(format!(
            "Failed to move {} to {}: {}",
            encrypted.display(),
            backup.display(),
            e
        ))
    })?;
    debug!(backup = %backup.display(), "moved original aside");

    let succeeded = match tool.encrypt(passphrase, plaintext, encrypted) {
        Ok(status) => status.success(),
        Err(e) => {
            warn!(error = %e, "encryption tool could not be run");
            false
        }
    };

    if succeeded {
        if let Err(e) = fs::remove_file(&backup) {
            warn!(backup = %backup.display(), error = %e, "failed to delete backup");
        }
        return Ok(());
    }

    restore(&backup, encrypted)?;
    Err(MiklaError::EncryptionFailed {
        path: encrypted.to_path_buf(),
    })
}

fn restore(backup: &Path, encrypted: &Path) -> MiklaResult<()> {
    match fs::remove_file(encrypted) {
        Ok(()) => debug!("discarded partial ciphertext"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(error = %e, "failed to discard partial ciphertext"),
    }

    fs::rename(backup, encrypted).map_err(|e| {
        MiklaError::Io(format!(
            "Encryption failed and the original could not be restored; it is still at {}: {}",
            backup.display(),
            e
        ))
    })?;
    debug!(path = %encrypted.display(), "restored original from backup");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::tools::ToolStatus;
    use tempfile::TempDir;

    /// Records what the backup looked like while the tool ran
    struct FakeTool {
        outcome: ToolStatus,
        partial_output: bool,
        seen_backup: RefCell<Option<Vec<u8>>>,
        calls: RefCell<usize>,
    }

    impl FakeTool {
        fn new(outcome: ToolStatus) -> Self {
            Self {
                outcome,
                partial_output: false,
                seen_backup: RefCell::new(None),
                calls: RefCell::new(0),
            }
        }
    }

    impl CipherTool for FakeTool {
        fn program(&self) -> &str {
            "fake"
        }

        fn decrypt(&self, _: &Passphrase, _: &Path, _: &Path) -> MiklaResult<ToolStatus> {
            unreachable!("decrypt is not part of re-encryption")
        }

        fn encrypt(
            &self,
            passphrase: &Passphrase,
            plaintext: &Path,
            output: &Path,
        ) -> MiklaResult<ToolStatus> {
            *self.calls.borrow_mut() += 1;
            *self.seen_backup.borrow_mut() = fs::read(backup_path(output)).ok();
            assert!(!output.exists(), "original must be moved aside first");

            if self.outcome.success() {
                let body = fs::read_to_string(plaintext).unwrap();
                fs::write(output, format!("ENC[{}]{}", passphrase.as_str(), body)).unwrap();
            } else if self.partial_output {
                fs::write(output, "-----BEGIN PGP MESS").unwrap();
            }
            Ok(self.outcome)
        }
    }

    fn fixture() -> (TempDir, PathBuf, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let encrypted = temp_dir.path().join("journal.asc");
        let plaintext = temp_dir.path().join("plain");
        fs::write(&encrypted, "ORIGINAL").unwrap();
        fs::write(&plaintext, "new entry").unwrap();
        (temp_dir, encrypted, plaintext)
    }

    #[test]
    fn test_backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/data/notes.gpg")),
            PathBuf::from("/data/notes.gpg.bak")
        );
        assert_eq!(backup_path(Path::new("notes")), PathBuf::from("notes.bak"));
    }

    #[test]
    fn test_success_replaces_and_removes_backup() {
        let (_dir, encrypted, plaintext) = fixture();
        let tool = FakeTool::new(ToolStatus::Success);

        reencrypt_with_backup(&tool, &Passphrase::new("Hobbes"), &plaintext, &encrypted).unwrap();

        assert_eq!(fs::read_to_string(&encrypted).unwrap(), "ENC[Hobbes]new entry");
        assert!(!backup_path(&encrypted).exists());
        assert_eq!(tool.seen_backup.borrow().as_deref(), Some(&b"ORIGINAL"[..]));
        assert_eq!(*tool.calls.borrow(), 1);
    }

    #[test]
    fn test_failure_restores_original() {
        let (_dir, encrypted, plaintext) = fixture();
        let tool = FakeTool::new(ToolStatus::Failed(Some(2)));

        let err = reencrypt_with_backup(&tool, &Passphrase::new("Hobbes"), &plaintext, &encrypted)
            .unwrap_err();

        assert!(matches!(err, MiklaError::EncryptionFailed { .. }));
        assert_eq!(fs::read_to_string(&encrypted).unwrap(), "ORIGINAL");
        assert!(!backup_path(&encrypted).exists());
        assert_eq!(*tool.calls.borrow(), 1);
    }

    #[test]
    fn test_failure_discards_partial_output() {
        let (_dir, encrypted, plaintext) = fixture();
        let mut tool = FakeTool::new(ToolStatus::Failed(None));
        tool.partial_output = true;

        let err = reencrypt_with_backup(&tool, &Passphrase::new("Hobbes"), &plaintext, &encrypted)
            .unwrap_err();

        assert!(matches!(err, MiklaError::EncryptionFailed { .. }));
        assert_eq!(fs::read_to_string(&encrypted).unwrap(), "ORIGINAL");
        assert!(!backup_path(&encrypted).exists());
    }

    #[test]
    fn test_spawn_error_restores_original() {
        struct Unlaunchable;

        impl CipherTool for Unlaunchable {
            fn program(&self) -> &str {
                "unlaunchable"
            }

            fn decrypt(&self, _: &Passphrase, _: &Path, _: &Path) -> MiklaResult<ToolStatus> {
                unreachable!()
            }

            fn encrypt(&self, _: &Passphrase, _: &Path, _: &Path) -> MiklaResult<ToolStatus> {
                Err(MiklaError::Io("Failed to start gpg".into()))
            }
        }

        let (_dir, encrypted, plaintext) = fixture();
        let err = reencrypt_with_backup(
            &Unlaunchable,
            &Passphrase::new("Hobbes"),
            &plaintext,
            &encrypted,
        )
        .unwrap_err();

        assert!(matches!(err, MiklaError::EncryptionFailed { .. }));
        assert_eq!(fs::read_to_string(&encrypted).unwrap(), "ORIGINAL");
    }

    #[test]
    fn test_existing_backup_is_never_overwritten() {
        let (_dir, encrypted, plaintext) = fixture();
        let backup = backup_path(&encrypted);
        fs::write(&backup, "OLDER ORIGINAL").unwrap();
        let tool = FakeTool::new(ToolStatus::Success);

        let err = reencrypt_with_backup(&tool, &Passphrase::new("Hobbes"), &plaintext, &encrypted)
            .unwrap_err();

        assert!(matches!(err, MiklaError::BackupExists { ref path } if *path == backup));
        assert!(err.to_string().contains("journal.asc.bak"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "OLDER ORIGINAL");
        assert_eq!(fs::read_to_string(&encrypted).unwrap(), "ORIGINAL");
        assert_eq!(*tool.calls.borrow(), 0);
    }

    #[test]
    fn test_ensure_no_backup() {
        let (_dir, encrypted, _plaintext) = fixture();
        assert!(ensure_no_backup(&encrypted).is_ok());

        fs::write(backup_path(&encrypted), "").unwrap();
        assert!(matches!(
            ensure_no_backup(&encrypted),
            Err(MiklaError::BackupExists { .. })
        ));
    }

    #[test]
    fn test_missing_original_is_io_error() {
        let (_dir, encrypted, plaintext) = fixture();
        fs::remove_file(&encrypted).unwrap();
        let tool = FakeTool::new(ToolStatus::Success);

        let err = reencrypt_with_backup(&tool, &Passphrase::new("Hobbes"), &plaintext, &encrypted)
            .unwrap_err();

        assert!(matches!(err, MiklaError::Io(_)));
        assert_eq!(*tool.calls.borrow(), 0);
    }
}
