//! New command implementation
//!
//! Scaffolds a module directory under the template root with a commented
//! `powar.yml`. The new module still has to be added to `global.yml` to
//! become enabled; the command prints a reminder.

use std::fs;

use anyhow::Result;
use clap::Args;

use crate::commands::Context;
use powar::defaults::MODULE_CONFIG_FILENAME;

/// Arguments for the new command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Name of the module to create
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Execute the `new` command.
pub fn execute(args: NewArgs, ctx: &Context) -> Result<()> {
    let module_dir = ctx.template_dir.join(&args.name);

    if module_dir.exists() {
        anyhow::bail!(
            "Module directory {} already exists, refusing to overwrite",
            module_dir.display()
        );
    }

    if ctx.dry_run {
        println!("🔎 Would create {}", module_dir.display());
        return Ok(());
    }

    fs::create_dir_all(&module_dir)?;
    fs::write(
        module_dir.join(MODULE_CONFIG_FILENAME),
        module_config_skeleton(&args.name),
    )?;

    println!("✅ Created module \"{}\" at {}", args.name, module_dir.display());
    println!(
        "💡 Add \"{}\" to the modules list in global.yml to enable it",
        args.name
    );

    Ok(())
}

/// Commented starter configuration for a fresh module.
fn module_config_skeleton(name: &str) -> String {
    format!(
        r#"# powar module configuration for "{name}"

# Map template files in this directory to their install destinations.
# Destinations may use ~ and $VARIABLES and must resolve to absolute paths.
install: {{}}
#  example.conf: ~/.config/{name}/example.conf

# Variables available to this module's templates (override global variables).
# A value wrapped in backticks is replaced by the command's stdout.
variables: {{}}

# System packages this module's files rely on (printed by `powar list`).
system_packages: []

# Modules that must be enabled for this one to work.
depends: []

# Optional shell commands run in this directory around installation.
#exec_before: ""
#exec_after: ""
"#
    )
}
