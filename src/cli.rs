//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, Context};
use powar::defaults;
use powar::paths;

/// Powar - deploy templated configuration files
#[derive(Parser, Debug)]
#[command(name = "powar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Use a custom directory for templates
    #[arg(long, global = true, value_name = "DIR", env = "POWAR_TEMPLATE_DIR")]
    template_dir: Option<String>,

    /// Use a custom directory for configuration
    #[arg(long, global = true, value_name = "DIR", env = "POWAR_CONFIG_DIR")]
    config_dir: Option<String>,

    /// Use a custom directory for the run cache
    #[arg(long, global = true, value_name = "DIR", env = "POWAR_CACHE_DIR")]
    cache_dir: Option<String>,

    /// Don't modify any files or run commands, just show what would be done
    #[arg(long, global = true)]
    dry_run: bool,

    /// Do not execute exec_before/exec_after hooks
    #[arg(long, global = true)]
    no_exec: bool,

    /// Escalate via sudo for destinations not owned by the current user
    #[arg(long, global = true)]
    root: bool,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease log verbosity (-q: warnings only, -qq: errors only)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render and install stale configuration files
    Install(commands::install::InstallArgs),
    /// List the system packages the enabled modules rely on
    List(commands::list::ListArgs),
    /// Scaffold a new module in the template directory
    New(commands::new::NewArgs),
    /// Scaffold the configuration and template directories
    Init(commands::init::InitArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        self.init_logging();
        let ctx = self.context()?;

        match self.command {
            Commands::Install(args) => commands::install::execute(args, &ctx),
            Commands::List(args) => commands::list::execute(args, &ctx),
            Commands::New(args) => commands::new::execute(args, &ctx),
            Commands::Init(args) => commands::init::execute(args, &ctx),
        }
    }

    fn init_logging(&self) {
        let level = match i16::from(self.verbose) - i16::from(self.quiet) {
            i16::MIN..=-2 => "error",
            -1 => "warn",
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
            .format_timestamp(None)
            .init();
    }

    /// Resolve directory overrides into an absolute execution context.
    fn context(&self) -> Result<Context> {
        Ok(Context {
            template_dir: resolve_dir(self.template_dir.as_deref(), defaults::default_template_dir)?,
            config_dir: resolve_dir(self.config_dir.as_deref(), defaults::default_config_dir)?,
            cache_dir: resolve_dir(self.cache_dir.as_deref(), defaults::default_cache_dir)?,
            dry_run: self.dry_run,
            execute_hooks: !self.no_exec,
            allow_root: self.root,
        })
    }
}

/// Expand `~`/`$VAR` in an override and require it absolute; fall back to the
/// platform default otherwise.
fn resolve_dir(flag: Option<&str>, default: fn() -> PathBuf) -> Result<PathBuf> {
    match flag {
        Some(dir) => Ok(paths::expand_absolute(dir)?),
        None => Ok(default()),
    }
}
