//! Init command implementation
//!
//! Scaffolds the configuration directory (with a commented `global.yml`) and
//! the template root. Idempotent: creates whatever is missing and never
//! overwrites an existing `global.yml`.

use std::fs;

use anyhow::Result;
use clap::Args;

use crate::commands::Context;
use powar::defaults::GLOBAL_CONFIG_FILENAME;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {}

/// Execute the `init` command.
pub fn execute(_args: InitArgs, ctx: &Context) -> Result<()> {
    let global_path = ctx.config_dir.join(GLOBAL_CONFIG_FILENAME);

    if ctx.dry_run {
        println!("🔎 Would create {}", ctx.template_dir.display());
        if !global_path.exists() {
            println!("🔎 Would create {}", global_path.display());
        }
        return Ok(());
    }

    fs::create_dir_all(&ctx.config_dir)?;
    fs::create_dir_all(&ctx.template_dir)?;

    if global_path.exists() {
        println!("💡 {} already exists, leaving it alone", global_path.display());
    } else {
        fs::write(&global_path, global_config_skeleton())?;
        println!("✅ Created {}", global_path.display());
    }

    println!("✅ Template directory: {}", ctx.template_dir.display());
    println!("💡 Run `powar new <name>` to scaffold your first module");

    Ok(())
}

/// Commented starter global configuration.
fn global_config_skeleton() -> &'static str {
    r#"# powar global configuration

# Enabled modules, processed in this order. Each entry names a directory
# in the template root.
modules: []

# Variables shared by every module's templates. A value wrapped in
# backticks is replaced by the command's stdout; parse`...` parses the
# stdout as YAML.
variables: {}

# Free-form options exposed to command substitutions.
options: {}
"#
}
