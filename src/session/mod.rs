//! The edit session
//!
//! One linear pipeline per invocation:
//!
//! 1. preflight checks
//! 2. session lock on the encrypted file
//! 3. password, typed twice
//! 4. decrypt into a fresh file in the volatile directory
//! 5. edit, with a checksum before and after
//! 6. re-encrypt with backup/rollback, only if the content changed
//! 7. delete the plaintext and release the lock, whatever happened
//!
//! The lock is an `flock` held by the kernel, so it also goes away when the
//! process is killed mid-session.
//!
//! # Example
//!
//! ```rust,ignore
//! use mikla::session::{EditSession, TerminalPrompt};
//! use mikla::tools::{CommandEditor, Gpg};
//!
//! let session = EditSession::new(Gpg::new("gpg", true), CommandEditor::parse("vim")?, "/dev/shm");
//! let outcome = session.run(Path::new("notes.asc"), &mut TerminalPrompt, &mut std::io::stdout())?;
//! ```

pub mod backup;
pub mod lock;
pub mod password;
pub mod plaintext;
pub mod preflight;

pub use backup::{backup_path, ensure_no_backup, reencrypt_with_backup};
pub use lock::SessionLock;
pub use password::{acquire_password, PasswordSource, TerminalPrompt, MISMATCH_NOTICE};
pub use plaintext::{unique_path, unique_path_with, PlaintextFile};
pub use preflight::preflight;

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::crypto::{Checksum, Passphrase};
use crate::error::{MiklaError, MiklaResult};
use crate::tools::{CipherTool, CommandEditor, Editor, Gpg};

/// How a successful session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The editor left the content as it was; nothing was written
    Unchanged,
    /// The content changed and the encrypted file was replaced
    Reencrypted,
}

/// Drives one encrypted file through decrypt, edit and re-encrypt
pub struct EditSession<C, E> {
    tool: C,
    editor: E,
    tmpfs: PathBuf,
}

impl EditSession<Gpg, CommandEditor> {
    /// Build a session from resolved configuration
    pub fn from_config(config: &Config) -> MiklaResult<Self> {
        Ok(Self::new(
            Gpg::new(config.gpg_program.clone(), config.armor),
            CommandEditor::parse(&config.editor)?,
            config.tmpfs.clone(),
        ))
    }
}

impl<C: CipherTool, E: Editor> EditSession<C, E> {
    pub fn new(tool: C, editor: E, tmpfs: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            editor,
            tmpfs: tmpfs.into(),
        }
    }

    /// Run the whole pipeline for `encrypted`
    ///
    /// Password prompts come from `passwords`; mismatch notices go to `notices`.
    pub fn run<P, W>(
        &self,
        encrypted: &Path,
        passwords: &mut P,
        notices: &mut W,
    ) -> MiklaResult<Outcome>
    where
        P: PasswordSource + ?Sized,
        W: Write + ?Sized,
    {
        preflight(self.tool.program(), encrypted, &self.tmpfs)?;
        let mut lock = SessionLock::open(encrypted)?;
        let _guard = lock.try_acquire()?;

        let passphrase = acquire_password(passwords, notices)?;
        let plaintext = decrypt_to_volatile(&self.tool, &passphrase, encrypted, &self.tmpfs)?;

        let result = self.edit_and_save(&passphrase, &plaintext, encrypted);

        // Deleting the plaintext comes first; its error only surfaces if the
        // session itself succeeded.
        let removed = plaintext.remove();
        let outcome = result?;
        removed?;

        info!(file = %encrypted.display(), ?outcome, "edit session finished");
        Ok(outcome)
    }

    fn edit_and_save(
        &self,
        passphrase: &Passphrase,
        plaintext: &PlaintextFile,
        encrypted: &Path,
    ) -> MiklaResult<Outcome> {
        if !edit_and_detect_change(&self.editor, plaintext.path())? {
            return Ok(Outcome::Unchanged);
        }

        reencrypt_with_backup(&self.tool, passphrase, plaintext.path(), encrypted)?;
        Ok(Outcome::Reencrypted)
    }
}

/// Decrypt `encrypted` into a fresh file under `dir`
///
/// On failure the partial output is deleted before the error is returned.
pub fn decrypt_to_volatile<C>(
    tool: &C,
    passphrase: &Passphrase,
    encrypted: &Path,
    dir: &Path,
) -> MiklaResult<PlaintextFile>
where
    C: CipherTool + ?Sized,
{
    let plaintext = PlaintextFile::create_in(dir)?;

    let status = tool.decrypt(passphrase, encrypted, plaintext.path())?;
    if !status.success() {
        debug!(?status, "decryption refused");
        return Err(MiklaError::DecryptionFailed {
            path: encrypted.to_path_buf(),
        });
    }

    Ok(plaintext)
}

/// Run the editor on `path` and report whether the content changed
///
/// A non-zero editor exit is logged but does not stop change detection; the
/// user may have saved before it happened.
pub fn edit_and_detect_change<E>(editor: &E, path: &Path) -> MiklaResult<bool>
where
    E: Editor + ?Sized,
{
    let before = Checksum::of_file(path)?;
    debug!(checksum = %before.to_hex(), "plaintext before editing");

    let status = editor.edit(path)?;
    if !status.success() {
        warn!(?status, "editor exited with an error");
    }

    let after = Checksum::of_file(path)?;
    debug!(checksum = %after.to_hex(), "plaintext after editing");

    Ok(before != after)
}
