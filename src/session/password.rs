//! Password acquisition
//!
//! The password is typed twice without echo; the loop repeats until both
//! entries match. A mismatch is the one recoverable condition in a session.

use std::io::Write;

use crate::crypto::Passphrase;
use crate::error::{MiklaError, MiklaResult};

/// Printed after every mismatched pair
pub const MISMATCH_NOTICE: &str = "Passwords don't match.";

/// A source of hidden password entries
pub trait PasswordSource {
    fn read_password(&mut self, prompt: &str) -> MiklaResult<Passphrase>;
}

/// Reads from the controlling terminal with echo disabled
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl PasswordSource for TerminalPrompt {
    fn read_password(&mut self, prompt: &str) -> MiklaResult<Passphrase> {
        rpassword::prompt_password(prompt)
            .map(Passphrase::from)
            .map_err(|e| MiklaError::PasswordInput(e.to_string()))
    }
}

/// Prompt for a password and its confirmation until they match
pub fn acquire_password<S, W>(source: &mut S, notices: &mut W) -> MiklaResult<Passphrase>
where
    S: PasswordSource + ?Sized,
    W: Write + ?Sized,
{
    loop {
        let first = source.read_password("Enter password: ")?;
        let second = source.read_password("Verify password: ")?;

        if first == second {
            return Ok(first);
        }

        writeln!(notices, "{}", MISMATCH_NOTICE)?;
    }
}
