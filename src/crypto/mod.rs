//! Secret handling and content digests
//!
//! The cipher itself lives in the external encryption tool; this module only
//! keeps the password out of logs and swap-friendly buffers, and fingerprints
//! plaintext so an edit can be detected.

pub mod checksum;
pub mod secure_memory;

pub use checksum::Checksum;
pub use secure_memory::Passphrase;
