//! Configuration module for mikla
//!
//! This module provides configuration management including:
//! - Settings file location
//! - Persisted user defaults (editor, volatile directory, encryption tool)
//! - Resolution of defaults, environment and flags into one `Config`

pub mod paths;
pub mod settings;

pub use paths::MiklaPaths;
pub use settings::{Config, Overrides, Settings};
