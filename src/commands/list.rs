//! List command implementation
//!
//! Prints the `system_packages` declared by each enabled module, one per
//! line, suitable for piping into a package manager. Touches neither the run
//! cache nor any destination file.

use anyhow::Result;
use clap::Args;
use log::warn;

use crate::commands::Context;
use powar::config::{GlobalConfig, ModuleConfig};
use powar::defaults::GLOBAL_CONFIG_FILENAME;

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list packages of these modules (default: every enabled module)
    #[arg(value_name = "MODULES")]
    pub modules: Vec<String>,
}

/// Execute the `list` command.
pub fn execute(args: ListArgs, ctx: &Context) -> Result<()> {
    let global_path = ctx.config_dir.join(GLOBAL_CONFIG_FILENAME);
    let global = GlobalConfig::from_file(&global_path)?;

    for requested in &args.modules {
        if !global.is_enabled(requested) {
            warn!("module \"{}\" is not enabled, ignoring", requested);
        }
    }

    for module in &global.modules {
        if !args.modules.is_empty() && !args.modules.contains(module) {
            continue;
        }
        let config = ModuleConfig::from_dir(&ctx.template_dir.join(module))?;
        for package in &config.system_packages {
            println!("{}", package);
        }
    }

    Ok(())
}
