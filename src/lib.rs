//! mikla - edit encrypted files without writing plaintext to disk
//!
//! The encrypted file is decrypted into a memory-backed directory, opened in
//! the user's editor, re-encrypted if it changed, and the plaintext is deleted
//! whatever the outcome. Encryption itself is delegated to GnuPG.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Settings file, defaults, and resolution into one `Config`
//! - `error`: Custom error types
//! - `crypto`: Zeroizing password type and content checksums
//! - `tools`: The external encryption tool and editor
//! - `session`: The decrypt, edit, re-encrypt pipeline
//!
//! # Example
//!
//! ```rust,ignore
//! use mikla::config::{MiklaPaths, Overrides, Settings};
//! use mikla::session::{EditSession, TerminalPrompt};
//!
//! let paths = MiklaPaths::new();
//! let config = Settings::load_or_default(&paths)?.resolve(Overrides::default())?;
//! let session = EditSession::from_config(&config)?;
//! session.run(Path::new("notes.asc"), &mut TerminalPrompt, &mut std::io::stdout())?;
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod session;
pub mod tools;

pub use error::{MiklaError, MiklaResult};
