//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `powar` application. It uses the `thiserror` library to create an `Error`
//! enum covering all anticipated failure modes, providing clear and
//! descriptive error messages.
//!
//! The taxonomy follows how failures propagate through a run:
//!
//! - **`Configuration`**: a problem in `global.yml` or a module's `powar.yml`
//!   (self-dependency, missing dependency, bad install destination, missing
//!   source file). Always carries the module name, and may carry several
//!   messages at once so a user sees every problem in one pass instead of
//!   fixing them one by one.
//! - **`ConfigParse`**: the file itself could not be read or deserialized
//!   (unknown field, malformed YAML).
//! - **`Execution`**: a hook or inline command exited nonzero. Fatal for the
//!   owning module's remaining steps, isolated from sibling modules.
//! - **`Template`**: a render failure from the template engine.
//! - **`Cache`**: the last-run cache could not be read or written. Fatal for
//!   the whole invocation.
//! - **`Io` / `Yaml`**: wrapped lower-level errors.
//!
//! The `Result` type alias is used throughout the library crate; the CLI
//! boundary converts into `anyhow::Result`.

use thiserror::Error;

/// Main error type for powar operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error occurred while reading or parsing a configuration file.
    #[error("Configuration parsing error in {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// One or more validation problems in a module's configuration.
    ///
    /// `messages` holds every problem found for the module, so a module
    /// depending on two disabled modules reports both names at once.
    #[error("Configuration error in module \"{module}\":{}", messages.iter().map(|m| format!("\n  - {}", m)).collect::<String>())]
    Configuration {
        module: String,
        messages: Vec<String>,
    },

    /// A shell command (hook or inline substitution) failed.
    #[error("Command failed ({command}): {message}")]
    Execution { command: String, message: String },

    /// An error occurred during template rendering.
    #[error("Template rendering error: {message}")]
    Template { message: String },

    /// An error occurred with the run cache.
    #[error("Cache operation error: {message}")]
    Cache { message: String },

    /// An error occurred with a path-related operation.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Build a `Configuration` error with a single message.
    pub fn config(module: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Configuration {
            module: module.into(),
            messages: vec![message.into()],
        }
    }
}

impl From<minijinja::Error> for Error {
    fn from(err: minijinja::Error) -> Self {
        Error::Template {
            message: err.to_string(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
