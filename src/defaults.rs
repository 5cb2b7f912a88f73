//! Default values for powar configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Filename of the global configuration inside the config directory.
pub const GLOBAL_CONFIG_FILENAME: &str = "global.yml";

/// Filename of the per-module configuration inside each module directory.
pub const MODULE_CONFIG_FILENAME: &str = "powar.yml";

/// Filename of the last-run timestamp inside the cache directory.
pub const LAST_RUN_FILENAME: &str = "last_run";

/// Returns the default configuration directory.
///
/// Uses the platform-appropriate config directory:
/// - Linux: `~/.config/powar` (XDG Base Directory)
/// - macOS: `~/Library/Application Support/powar`
///
/// Falls back to `.powar` in the current directory if the platform config
/// directory cannot be determined. Can be overridden by `--config-dir`.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".powar"))
        .join("powar")
}

/// Returns the default template root directory.
///
/// Sibling of the config directory, e.g. `~/.config/powar-templates` on
/// Linux. Can be overridden by `--template-dir`.
pub fn default_template_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".powar"))
        .join("powar-templates")
}

/// Returns the default cache directory holding the last-run timestamp.
///
/// Uses the platform data directory (e.g. `~/.local/share/powar` on Linux).
/// Can be overridden by `--cache-dir`.
pub fn default_cache_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from(".powar-cache"))
        .join("powar")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dirs_end_with_app_name() {
        assert!(default_config_dir().ends_with("powar"));
        assert!(default_template_dir().ends_with("powar-templates"));
        assert!(default_cache_dir().ends_with("powar"));
    }

    #[test]
    fn test_default_dirs_absolute_or_fallback() {
        let config = default_config_dir();
        assert!(
            config.is_absolute() || config.starts_with(".powar"),
            "Expected absolute path or fallback, got: {:?}",
            config
        );
    }
}
