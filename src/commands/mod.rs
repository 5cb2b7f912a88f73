//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `powar`
//! command-line tool. Each subcommand is defined in its own file:
//!
//! - An `Args` struct defines the command-specific arguments, derived using
//!   `clap`.
//! - An `execute` function takes the parsed `Args` plus the shared `Context`
//!   (resolved directories and cross-cutting flags) and performs the
//!   command's logic, calling into the `powar` library.

use std::path::PathBuf;

pub mod init;
pub mod install;
pub mod list;
pub mod new;

/// Resolved directories and cross-cutting flags shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    /// Template root: one directory per module.
    pub template_dir: PathBuf,
    /// Configuration directory holding `global.yml`.
    pub config_dir: PathBuf,
    /// Cache directory holding the last-run timestamp.
    pub cache_dir: PathBuf,
    /// Log actions without performing them.
    pub dry_run: bool,
    /// Whether lifecycle hooks run (`--no-exec` disables).
    pub execute_hooks: bool,
    /// Escalate unwritable destinations via sudo.
    pub allow_root: bool,
}
