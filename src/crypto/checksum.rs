//! Content checksums for change detection
//!
//! SHA-256 over the file contents. Only equality matters; the hex form is for
//! debug logging.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{MiklaError, MiklaResult};

/// SHA-256 digest of a file's contents
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Checksum([u8; 32]);

impl Checksum {
    /// Digest the contents of the file at `path`
    pub fn of_file(path: &Path) -> MiklaResult<Self> {
        let file = File::open(path).map_err(|e| {
            MiklaError::Io(format!("Failed to open {} for checksum: {}", path.display(), e))
        })?;
        Self::of_reader(file).map_err(|e| {
            MiklaError::Io(format!("Failed to read {} for checksum: {}", path.display(), e))
        })
    }

    /// Digest everything `reader` yields
    pub fn of_reader(mut reader: impl Read) -> io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Self(hasher.finalize().into()))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", self.to_hex())
    }
}
