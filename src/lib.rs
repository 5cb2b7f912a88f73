//! # Powar Library
//!
//! Core functionality for powar, a templated configuration deployer. The
//! `powar` binary is a thin wrapper around this crate.
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: the global config (`global.yml`) names the
//!   enabled modules and shared variables; each module directory carries a
//!   `powar.yml` with its install mapping, variables, dependencies, and
//!   lifecycle hooks.
//! - **Run Cache (`cache`)**: a single persisted timestamp of the last
//!   successful pass.
//! - **Staleness (`staleness`)**: decides per source file whether it needs
//!   re-rendering, from file mtimes relative to the last run.
//! - **Templates (`template`)**: minijinja rendering with external-output
//!   extraction and command substitution in configuration values.
//! - **Installation (`installer`)**: the per-module pipeline of dependency
//!   validation, staleness filtering, hooks, rendering, and privilege-aware
//!   writes.
//!
//! ## Execution Flow
//!
//! An `install` pass loads the global config, reads the run cache once,
//! builds the staleness tracker, processes each enabled module in declared
//! order (a failing module is logged and skipped, not fatal), and records the
//! pass timestamp when every module succeeded.

pub mod cache;
pub mod config;
pub mod defaults;
pub mod error;
pub mod exec;
pub mod installer;
pub mod paths;
pub mod staleness;
pub mod template;
