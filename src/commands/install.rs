//! Install command implementation
//!
//! The install command runs the full pass:
//! 1. Load the global configuration (fatal on error)
//! 2. Expand command substitutions in the global variables
//! 3. Read the run cache and build the staleness tracker
//! 4. Process each enabled module in declared order; a failing module is
//!    logged and skipped, siblings still run
//! 5. Record the pass timestamp when every module succeeded

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use clap::Args;
use log::{error, warn};

use crate::commands::Context;
use powar::cache::RunCache;
use powar::config::{GlobalConfig, ModuleConfig};
use powar::defaults::GLOBAL_CONFIG_FILENAME;
use powar::installer::{InstallOptions, InstallReport, ModuleInstaller};
use powar::staleness::StalenessTracker;
use powar::template::Renderer;

/// Arguments for the install command
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Only process these modules (default: every enabled module)
    #[arg(value_name = "MODULES")]
    pub modules: Vec<String>,

    /// Treat every file as stale and re-render everything
    #[arg(short, long)]
    pub force: bool,
}

/// Execute the `install` command.
pub fn execute(args: InstallArgs, ctx: &Context) -> Result<()> {
    let start_time = Instant::now();

    let global_path = ctx.config_dir.join(GLOBAL_CONFIG_FILENAME);
    if !global_path.exists() {
        anyhow::bail!(
            "Global configuration not found: {} (run `powar init` first)",
            global_path.display()
        );
    }
    let global = GlobalConfig::from_file(&global_path)?;

    // Positional args narrow the pass to a subset of the enabled modules;
    // declared order is preserved either way.
    for requested in &args.modules {
        if !global.is_enabled(requested) {
            warn!("module \"{}\" is not enabled, ignoring", requested);
        }
    }
    let selected: Vec<String> = global
        .modules
        .iter()
        .filter(|m| args.modules.is_empty() || args.modules.contains(m))
        .cloned()
        .collect();

    let cache = RunCache::new(&ctx.cache_dir);
    let last_run = cache.last_run()?;

    // Command substitution in global variables runs in the config directory
    let renderer = Renderer::new(&ctx.config_dir);
    let global_variables =
        renderer.expand_variables(&global.variables, &serde_yaml::Mapping::new())?;

    let tracker = StalenessTracker::new(last_run, &global_path, &ctx.template_dir, &selected)?;

    let options = InstallOptions {
        dry_run: ctx.dry_run,
        execute_hooks: ctx.execute_hooks,
        force: args.force,
        allow_root: ctx.allow_root,
    };

    if ctx.dry_run {
        println!("🔎 DRY RUN MODE - No changes will be made");
        println!();
    }

    let mut totals = InstallReport::default();
    let mut failed_modules = 0usize;

    for module in &selected {
        let result = install_module(module, ctx, &global, &global_variables, &tracker, &options);
        match result {
            Ok(report) => {
                totals.installed += report.installed;
                totals.skipped += report.skipped;
            }
            Err(e) => {
                error!("{}", e);
                failed_modules += 1;
            }
        }
    }

    // The cache only moves forward after a fully successful pass; a partial
    // failure leaves it untouched so the next run reconsiders those files.
    if failed_modules == 0 && !ctx.dry_run {
        cache.set_last_run(unix_now())?;
    }

    let duration = start_time.elapsed();
    if failed_modules > 0 {
        println!(
            "⚠️  {} of {} modules failed (see errors above)",
            failed_modules,
            selected.len()
        );
    }
    println!(
        "✅ {} {} files ({} skipped) across {} modules in {:.2}s",
        if ctx.dry_run { "Would install" } else { "Installed" },
        totals.installed,
        totals.skipped,
        selected.len() - failed_modules,
        duration.as_secs_f64()
    );

    Ok(())
}

/// Process one module; any error here is module-local.
fn install_module(
    module: &str,
    ctx: &Context,
    global: &GlobalConfig,
    global_variables: &serde_yaml::Mapping,
    tracker: &StalenessTracker,
    options: &InstallOptions,
) -> powar::error::Result<InstallReport> {
    let config = ModuleConfig::from_dir(&ctx.template_dir.join(module))?;
    let installer = ModuleInstaller::new(
        module,
        &ctx.template_dir,
        &config,
        global,
        global_variables,
        tracker,
        options,
    )?;
    installer.run()
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
