//! # Configuration Schema and Parsing
//!
//! This module defines the data structures for the two configuration files
//! powar consumes, and the logic for loading them:
//!
//! - **`GlobalConfig`** (`global.yml` in the config directory): the ordered
//!   list of enabled modules plus variables shared by every module and an
//!   open `options` bag handed to command substitutions.
//! - **`ModuleConfig`** (`powar.yml` in each module directory): the
//!   source-to-destination install mapping, module-local variables, advisory
//!   system packages, declared dependencies, and optional lifecycle hooks.
//!
//! Both schemas are strict: an unrecognized field fails parsing with a
//! message naming the file, instead of being silently ignored.
//!
//! Variable values are arbitrary YAML and may use the backtick command
//! substitution sentinels; expansion happens in [`crate::template`], after
//! loading, so the structures here always hold literal YAML values.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::defaults::MODULE_CONFIG_FILENAME;
use crate::error::{Error, Result};

/// The global configuration record (`global.yml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Enabled modules, in processing order. Each entry names a directory
    /// under the template root.
    pub modules: Vec<String>,

    /// Variables shared across all modules.
    #[serde(default)]
    pub variables: serde_yaml::Mapping,

    /// Open-ended options bag, exposed to command substitutions.
    #[serde(default)]
    pub options: serde_yaml::Mapping,
}

impl GlobalConfig {
    /// Load and validate the global configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: GlobalConfig = parse_yaml_file(path)?;

        let mut seen = HashMap::new();
        for module in &config.modules {
            if seen.insert(module.as_str(), ()).is_some() {
                return Err(Error::ConfigParse {
                    path: path.display().to_string(),
                    message: format!("module \"{}\" is listed more than once", module),
                });
            }
        }

        Ok(config)
    }

    /// Whether `name` is an enabled module.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.modules.iter().any(|m| m == name)
    }
}

/// A lifecycle point a hook can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
    /// `exec_before`: runs before any file of the module is installed.
    Before,
    /// `exec_after`: runs after the module's files were installed.
    After,
}

impl HookPoint {
    /// The configuration field name, for log messages.
    pub fn field_name(self) -> &'static str {
        match self {
            HookPoint::Before => "exec_before",
            HookPoint::After => "exec_after",
        }
    }
}

/// The per-module configuration record (`powar.yml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    /// Source filename (relative to the module directory) to destination
    /// path. Destinations may use `~` and `$VAR` and must resolve absolute.
    /// Order is preserved from the YAML document.
    #[serde(default)]
    pub install: IndexMap<String, String>,

    /// Module-local variables; override global variables on key collision.
    #[serde(default)]
    pub variables: serde_yaml::Mapping,

    /// Advisory list of system packages this module's files rely on.
    /// Printed by `powar list`, never installed.
    #[serde(default)]
    pub system_packages: Vec<String>,

    /// Names of modules this module depends on. Validated for existence
    /// against the enabled set; not used for ordering.
    #[serde(default)]
    pub depends: Vec<String>,

    /// Shell command run in the module directory before installing files.
    #[serde(default)]
    pub exec_before: Option<String>,

    /// Shell command run in the module directory after installing files.
    #[serde(default)]
    pub exec_after: Option<String>,
}

impl ModuleConfig {
    /// Load a module configuration from `<module_dir>/powar.yml`.
    pub fn from_dir(module_dir: &Path) -> Result<Self> {
        parse_yaml_file(&Self::path_in(module_dir))
    }

    /// Path of the module configuration file inside `module_dir`.
    pub fn path_in(module_dir: &Path) -> PathBuf {
        module_dir.join(MODULE_CONFIG_FILENAME)
    }

    /// Look up a hook command by lifecycle point.
    pub fn hook(&self, point: HookPoint) -> Option<&str> {
        match point {
            HookPoint::Before => self.exec_before.as_deref(),
            HookPoint::After => self.exec_after.as_deref(),
        }
    }
}

/// Merge global and module variables; module values win on collision.
pub fn merged_variables(
    global: &serde_yaml::Mapping,
    module: &serde_yaml::Mapping,
) -> serde_yaml::Mapping {
    let mut merged = global.clone();
    for (key, value) in module {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn parse_yaml_file<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    serde_yaml::from_str(&contents).map_err(|e| Error::ConfigParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_global(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("global.yml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_global_config_minimal() {
        let temp = TempDir::new().unwrap();
        let path = write_global(temp.path(), "modules:\n  - vim\n  - zsh\n");
        let config = GlobalConfig::from_file(&path).unwrap();
        assert_eq!(config.modules, vec!["vim", "zsh"]);
        assert!(config.variables.is_empty());
        assert!(config.is_enabled("vim"));
        assert!(!config.is_enabled("emacs"));
    }

    #[test]
    fn test_global_config_with_variables_and_options() {
        let temp = TempDir::new().unwrap();
        let path = write_global(
            temp.path(),
            "modules: [vim]\nvariables:\n  color: red\noptions:\n  editor: nvim\n",
        );
        let config = GlobalConfig::from_file(&path).unwrap();
        assert_eq!(
            config.variables.get("color"),
            Some(&serde_yaml::Value::String("red".into()))
        );
        assert_eq!(
            config.options.get("editor"),
            Some(&serde_yaml::Value::String("nvim".into()))
        );
    }

    #[test]
    fn test_global_config_rejects_unknown_field() {
        let temp = TempDir::new().unwrap();
        let path = write_global(temp.path(), "modules: [vim]\nmodlues: [zsh]\n");
        let err = GlobalConfig::from_file(&path).unwrap_err();
        let display = err.to_string();
        assert!(display.contains("global.yml"));
        assert!(display.contains("modlues"));
    }

    #[test]
    fn test_global_config_rejects_duplicate_module() {
        let temp = TempDir::new().unwrap();
        let path = write_global(temp.path(), "modules: [vim, zsh, vim]\n");
        let err = GlobalConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_module_config_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(MODULE_CONFIG_FILENAME), "{}").unwrap();
        let config = ModuleConfig::from_dir(temp.path()).unwrap();
        assert!(config.install.is_empty());
        assert!(config.depends.is_empty());
        assert!(config.hook(HookPoint::Before).is_none());
        assert!(config.hook(HookPoint::After).is_none());
    }

    #[test]
    fn test_module_config_full() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(MODULE_CONFIG_FILENAME),
            concat!(
                "install:\n  vimrc: ~/.vimrc\n  gvimrc: ~/.gvimrc\n",
                "variables:\n  background: dark\n",
                "system_packages: [vim, fzf]\n",
                "depends: [shell]\n",
                "exec_before: echo before\n",
                "exec_after: echo after\n",
            ),
        )
        .unwrap();
        let config = ModuleConfig::from_dir(temp.path()).unwrap();

        // IndexMap preserves document order
        let sources: Vec<&String> = config.install.keys().collect();
        assert_eq!(sources, vec!["vimrc", "gvimrc"]);
        assert_eq!(config.system_packages, vec!["vim", "fzf"]);
        assert_eq!(config.depends, vec!["shell"]);
        assert_eq!(config.hook(HookPoint::Before), Some("echo before"));
        assert_eq!(config.hook(HookPoint::After), Some("echo after"));
    }

    #[test]
    fn test_module_config_rejects_unknown_field() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(MODULE_CONFIG_FILENAME),
            "isntall:\n  vimrc: ~/.vimrc\n",
        )
        .unwrap();
        let err = ModuleConfig::from_dir(temp.path()).unwrap_err();
        assert!(err.to_string().contains("isntall"));
    }

    #[test]
    fn test_merged_variables_module_wins() {
        let mut global = serde_yaml::Mapping::new();
        global.insert("a".into(), "global".into());
        global.insert("b".into(), "global".into());
        let mut module = serde_yaml::Mapping::new();
        module.insert("b".into(), "module".into());

        let merged = merged_variables(&global, &module);
        assert_eq!(merged.get("a"), Some(&serde_yaml::Value::String("global".into())));
        assert_eq!(merged.get("b"), Some(&serde_yaml::Value::String("module".into())));
    }
}
