//! # Module Installation Pipeline
//!
//! One `ModuleInstaller` processes one module through a fixed sequence:
//! dependency validation, staleness filtering, the `exec_before` hook,
//! rendering and writing each selected file (plus any external outputs the
//! template declared), and the `exec_after` hook. A failure at any step stops
//! this module and is reported to the orchestrator, which carries on with the
//! next one.
//!
//! Two deliberate asymmetries in error handling:
//!
//! - Hook and dependency failures abort the module: installing files whose
//!   preconditions did not run would leave the destination half-configured.
//! - A single unwritable destination only skips that file. A path that needs
//!   elevation the user declined should not block unrelated files.
//!
//! When a destination is not owned by the current user the write either goes
//! through `sudo -E tee` (when the run was started with `--root`) or is
//! skipped with a warning. It is never reported as success silently.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::{merged_variables, GlobalConfig, HookPoint, ModuleConfig};
use crate::error::{Error, Result};
use crate::exec;
use crate::paths;
use crate::staleness::StalenessTracker;
use crate::template::Renderer;

/// Cross-cutting flags for a whole `install` pass.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Log every action without touching the filesystem or running hooks.
    pub dry_run: bool,
    /// Whether `exec_before` / `exec_after` hooks run at all (`--no-exec`
    /// disables them).
    pub execute_hooks: bool,
    /// Treat every file as stale, bypassing the staleness tracker.
    pub force: bool,
    /// Escalate unwritable destinations through sudo instead of skipping.
    pub allow_root: bool,
}

/// What happened while processing one module.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Files written (primary destinations plus external outputs).
    pub installed: usize,
    /// Files skipped because the destination was not writable.
    pub skipped: usize,
}

/// Installs the files of a single module.
pub struct ModuleInstaller<'a> {
    module_name: &'a str,
    module_dir: PathBuf,
    config: &'a ModuleConfig,
    global: &'a GlobalConfig,
    tracker: &'a StalenessTracker,
    options: &'a InstallOptions,
    renderer: Renderer,
    scope: serde_yaml::Mapping,
}

impl<'a> ModuleInstaller<'a> {
    /// Prepare the installer for `module_name`.
    ///
    /// `global_variables` must already be command-substitution expanded; the
    /// module's own variables are expanded here, against the merged scope,
    /// with commands running in the module directory.
    pub fn new(
        module_name: &'a str,
        template_dir: &Path,
        config: &'a ModuleConfig,
        global: &'a GlobalConfig,
        global_variables: &serde_yaml::Mapping,
        tracker: &'a StalenessTracker,
        options: &'a InstallOptions,
    ) -> Result<Self> {
        let module_dir = template_dir.join(module_name);
        let renderer = Renderer::new(&module_dir);
        let module_variables = renderer.expand_variables(&config.variables, global_variables)?;
        let scope = merged_variables(global_variables, &module_variables);

        Ok(Self {
            module_name,
            module_dir,
            config,
            global,
            tracker,
            options,
            renderer,
            scope,
        })
    }

    /// Run the full pipeline for this module.
    pub fn run(&self) -> Result<InstallReport> {
        self.validate_dependencies()?;

        let selected = self.select_files()?;

        // No-op short-circuit: the module maps files but none are stale, so
        // skip the hooks too. A hooks-only module (empty install map) still
        // runs its hooks every pass.
        if !self.config.install.is_empty() && selected.is_empty() {
            info!("{}: no files to install or update", self.module_name);
            return Ok(InstallReport::default());
        }

        self.run_hook(HookPoint::Before)?;

        let mut report = InstallReport::default();
        for (source, dest) in &selected {
            self.install_rendered(source, dest, &mut report)?;
        }

        self.run_hook(HookPoint::After)?;

        Ok(report)
    }

    /// Reject self-dependencies and dependencies on modules that are not
    /// enabled. Every problem is collected before failing, so the user sees
    /// all missing names at once.
    fn validate_dependencies(&self) -> Result<()> {
        let mut messages = Vec::new();

        for dep in &self.config.depends {
            if dep == self.module_name {
                messages.push(format!(
                    "module \"{}\" cannot depend on itself",
                    self.module_name
                ));
            } else if !self.global.is_enabled(dep) {
                messages.push(format!(
                    "module \"{}\" depends on \"{}\", but this is not enabled",
                    self.module_name, dep
                ));
            }
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(Error::Configuration {
                module: self.module_name.to_string(),
                messages,
            })
        }
    }

    /// Resolve the install map into `(source path, destination path)` pairs
    /// that need rendering this pass.
    ///
    /// Configuration problems (missing source file, non-absolute destination)
    /// are aggregated over all entries instead of failing on the first.
    fn select_files(&self) -> Result<Vec<(PathBuf, PathBuf)>> {
        let dir_files: HashSet<String> = fs::read_dir(&self.module_dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();

        let mut problems = Vec::new();
        let mut selected = Vec::new();

        for (source, dest) in &self.config.install {
            if !dir_files.contains(source) {
                problems.push(format!(
                    "file \"{}\" is not in directory {}",
                    source,
                    self.module_dir.display()
                ));
                continue;
            }

            let dest = match paths::expand_absolute(dest) {
                Ok(path) => path,
                Err(_) => {
                    problems.push(format!("install path needs to be absolute: {}", dest));
                    continue;
                }
            };

            let source_path = self.module_dir.join(source);
            if self.options.force || self.tracker.should_update(&source_path)? {
                selected.push((source_path, dest));
            } else {
                debug!("{}: up to date, skipping {}", self.module_name, source);
            }
        }

        if problems.is_empty() {
            Ok(selected)
        } else {
            Err(Error::Configuration {
                module: self.module_name.to_string(),
                messages: problems,
            })
        }
    }

    /// Run the hook bound to `point`, if configured and enabled. The command
    /// is itself a template, rendered against the module's variable scope.
    fn run_hook(&self, point: HookPoint) -> Result<()> {
        if !self.options.execute_hooks {
            return Ok(());
        }
        let Some(command) = self.config.hook(point) else {
            return Ok(());
        };

        let rendered = self.renderer.render_str(command, &self.scope)?;

        if self.options.dry_run {
            info!(
                "{}: would run {} hook: {}",
                self.module_name,
                point.field_name(),
                rendered
            );
            return Ok(());
        }

        exec::run(&rendered, &self.module_dir)?;
        info!(
            "{}: ran {} hook: {}",
            self.module_name,
            point.field_name(),
            rendered
        );
        Ok(())
    }

    /// Render one source file and write the primary output plus any external
    /// outputs the template declared.
    fn install_rendered(
        &self,
        source: &Path,
        dest: &Path,
        report: &mut InstallReport,
    ) -> Result<()> {
        let contents = fs::read_to_string(source)?;
        let (rendered, externals) = self.renderer.render_template(&contents, &self.scope)?;

        let source_label = source.display().to_string();
        self.install_file(&source_label, dest, &rendered, report);

        for (ext_name, ext_content) in &externals {
            // Externals land next to the primary destination
            let ext_dest = match dest.parent() {
                Some(parent) => parent.join(ext_name),
                None => PathBuf::from(ext_name),
            };
            let ext_label = format!("{} (external {})", source_label, ext_name);
            self.install_file(&ext_label, &ext_dest, ext_content, report);
        }

        Ok(())
    }

    /// Write `content` (plus a trailing newline) to `dest`, escalating or
    /// skipping when the destination is not owned by the current user. Write
    /// failures skip the file with a warning; they never abort the module.
    fn install_file(&self, source: &str, dest: &Path, content: &str, report: &mut InstallReport) {
        let elevate = match needs_elevation(dest) {
            Ok(elevate) => elevate,
            Err(e) => {
                warn!("unable to write {}, skipping: {}", dest.display(), e);
                report.skipped += 1;
                return;
            }
        };

        if elevate && !self.options.allow_root {
            warn!(
                "installing at \"{}\" requires root, skipping (re-run with --root)",
                dest.display()
            );
            report.skipped += 1;
            return;
        }

        if self.options.dry_run {
            info!("would install: {} -> {}", source, dest.display());
            report.installed += 1;
            return;
        }

        let payload = format!("{}\n", content);
        let result = if elevate {
            let command = format!("sudo -E tee {}", shell_quote(&dest.display().to_string()));
            exec::run_with_stdin(&command, &self.module_dir, &payload).map_err(std::io::Error::other)
        } else {
            fs::write(dest, &payload)
        };

        match result {
            Ok(()) => {
                info!("done: {} -> {}", source, dest.display());
                report.installed += 1;
            }
            Err(e) => {
                warn!("unable to write {}, skipping: {}", dest.display(), e);
                report.skipped += 1;
            }
        }
    }
}

/// Pure decision: does writing `dest` require privilege escalation?
///
/// True when the destination (or, if it does not exist yet, its parent
/// directory) is owned by a different user. The escalation mechanism itself
/// is the installer's concern, not this function's.
#[cfg(unix)]
pub fn needs_elevation(dest: &Path) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let metadata = match fs::metadata(dest) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let parent = dest.parent().ok_or_else(|| Error::Path {
                message: format!("{} has no parent directory", dest.display()),
            })?;
            fs::metadata(parent)?
        }
        Err(e) => return Err(e.into()),
    };

    Ok(metadata.uid() != current_uid())
}

#[cfg(not(unix))]
pub fn needs_elevation(_dest: &Path) -> Result<bool> {
    Ok(false)
}

#[cfg(unix)]
fn current_uid() -> u32 {
    // getuid is always safe to call
    unsafe { libc::getuid() }
}

/// Single-quote a string for `sh -c`.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
