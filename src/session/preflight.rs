//! Preflight checks
//!
//! Cheap local checks that run before any subprocess, so a guaranteed failure
//! is reported in mikla's own words rather than through the tool's stderr.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use super::backup::{backup_path, ensure_no_backup};
use crate::error::{MiklaError, MiklaResult};
use crate::tools::find_executable;

/// Verify, in order, that the tool resolves, the encrypted file exists and is
/// readable, no backup from an interrupted session is in the way, and the
/// volatile directory accepts new files.
pub fn preflight(tool: &str, encrypted: &Path, tmpfs: &Path) -> MiklaResult<()> {
    let program = find_executable(tool).ok_or_else(|| MiklaError::ToolNotFound {
        tool: tool.to_string(),
    })?;
    debug!(tool = %program.display(), "resolved encryption tool");

    check_readable(encrypted)?;
    ensure_no_backup(encrypted)?;
    check_writable_dir(tmpfs)?;

    Ok(())
}

fn check_readable(encrypted: &Path) -> MiklaResult<()> {
    let metadata = match fs::metadata(encrypted) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let bak = backup_path(encrypted);
            let backup = bak.exists().then_some(bak);
            return Err(MiklaError::file_not_found(encrypted, backup));
        }
        Err(_) => {
            return Err(MiklaError::FileNotReadable {
                path: encrypted.to_path_buf(),
            })
        }
    };

    if metadata.is_dir() || File::open(encrypted).is_err() {
        return Err(MiklaError::FileNotReadable {
            path: encrypted.to_path_buf(),
        });
    }

    Ok(())
}

/// Probe by creating an anonymous file; mode bits miss read-only mounts and ACLs
fn check_writable_dir(dir: &Path) -> MiklaResult<()> {
    tempfile::tempfile_in(dir)
        .map(drop)
        .map_err(|_| MiklaError::DirectoryNotWritable {
            path: dir.to_path_buf(),
        })
}
