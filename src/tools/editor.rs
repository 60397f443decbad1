//! The user's text editor
//!
//! Runs attached to the controlling terminal; the session blocks until it exits.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use super::ToolStatus;
use crate::error::{MiklaError, MiklaResult};

/// An interactive editor that edits a file in place
pub trait Editor {
    /// Edit the file at `path`, returning once the editor has exited
    fn edit(&self, path: &Path) -> MiklaResult<ToolStatus>;
}

/// Editor launched from a command line such as `vim` or `code --wait`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEditor {
    program: String,
    args: Vec<String>,
}

impl CommandEditor {
    /// Parse an editor command line; words are split on whitespace
    pub fn parse(command: &str) -> MiklaResult<Self> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| MiklaError::Config("editor command is empty".into()))?;

        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Editor for CommandEditor {
    fn edit(&self, path: &Path) -> MiklaResult<ToolStatus> {
        debug!(editor = %self.program, "launching editor");

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()
            .map_err(|e| MiklaError::EditorFailed(format!("could not start {}: {}", self.program, e)))?;

        Ok(status.into())
    }
}
