//! Staleness detection for template source files
//!
//! A source file must be re-rendered when its own mtime is newer than the
//! last successful run, when the global configuration changed (its variables
//! feed every module), or when the owning module's configuration changed (a
//! changed `powar.yml` may alter the rendering of every file in that module,
//! so all of them are forced stale).
//!
//! All decisions are computed once at construction from filesystem mtimes;
//! `should_update` itself only stats the queried source file. Callers must
//! only query files they already know to exist.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::config::ModuleConfig;
use crate::defaults::MODULE_CONFIG_FILENAME;
use crate::error::{Error, Result};

/// Decides, per source file, whether it needs re-rendering.
#[derive(Debug)]
pub struct StalenessTracker {
    last_run: f64,
    global_changed: bool,
    force_update: HashSet<PathBuf>,
}

impl StalenessTracker {
    /// Build the tracker for one pass.
    ///
    /// `modules` is the list of enabled modules that will be processed;
    /// each must have a config file at `<template_dir>/<module>/powar.yml`.
    pub fn new(
        last_run: f64,
        global_config_path: &Path,
        template_dir: &Path,
        modules: &[String],
    ) -> Result<Self> {
        let global_changed = mtime(global_config_path)? > last_run;

        let mut force_update = HashSet::new();
        for module in modules {
            let module_dir = template_dir.join(module);
            let config_path = ModuleConfig::path_in(&module_dir);

            if mtime(&config_path)? > last_run {
                for entry in std::fs::read_dir(&module_dir)? {
                    let path = entry?.path();
                    if path.file_name().and_then(|n| n.to_str()) != Some(MODULE_CONFIG_FILENAME) {
                        force_update.insert(path);
                    }
                }
            }
        }

        Ok(Self {
            last_run,
            global_changed,
            force_update,
        })
    }

    /// Whether `source` (an absolute path to an existing file) must be
    /// re-rendered this pass.
    pub fn should_update(&self, source: &Path) -> Result<bool> {
        if self.global_changed || self.force_update.contains(source) {
            return Ok(true);
        }
        Ok(mtime(source)? > self.last_run)
    }
}

/// Modification time of `path` as a float Unix timestamp.
pub fn mtime(path: &Path) -> Result<f64> {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| Error::Path {
            message: format!("cannot stat {}: {}", path.display(), e),
        })?;
    let duration = modified.duration_since(UNIX_EPOCH).map_err(|e| Error::Path {
        message: format!("mtime of {} predates the epoch: {}", path.display(), e),
    })?;
    Ok(duration.as_secs_f64())
}
