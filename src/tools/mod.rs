//! External programs the edit session drives
//!
//! Both collaborators sit behind traits so the session can be exercised with
//! scripted fakes:
//!
//! - [`CipherTool`]: decrypts to and encrypts from a file path (GnuPG)
//! - [`Editor`]: edits a file interactively in the foreground

pub mod editor;
pub mod gpg;

pub use editor::{CommandEditor, Editor};
pub use gpg::{find_executable, CipherTool, Gpg};

/// How an external program finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    /// Exit status zero
    Success,
    /// Non-zero exit status, or `None` when killed by a signal
    Failed(Option<i32>),
}

impl ToolStatus {
    pub fn success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<std::process::ExitStatus> for ToolStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if status.success() {
            Self::Success
        } else {
            Self::Failed(status.code())
        }
    }
}
