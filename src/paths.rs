//! Path expansion utilities for powar
//!
//! Destination paths and directory overrides may contain `~` and environment
//! variable references (`$HOME`, `${XDG_CONFIG_HOME}`); they are expanded
//! here before being treated as real filesystem paths.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Expand `~` and environment variables in a path string.
///
/// Undefined variables are an error rather than being passed through
/// verbatim, since a literal `$TYPO` in an install destination would
/// otherwise create a directory named `$TYPO`.
pub fn expand(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).map_err(|e| Error::Path {
        message: format!("cannot expand \"{}\": {}", path, e),
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Expand a path and require the result to be absolute.
pub fn expand_absolute(path: &str) -> Result<PathBuf> {
    let expanded = expand(path)?;
    if !expanded.is_absolute() {
        return Err(Error::Path {
            message: format!("path needs to be absolute: {}", path),
        });
    }
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_expand_tilde() {
        std::env::set_var("HOME", "/home/test");
        let expanded = expand("~/.config/foo").unwrap();
        assert_eq!(expanded, PathBuf::from("/home/test/.config/foo"));
    }

    #[test]
    #[serial]
    fn test_expand_env_var() {
        std::env::set_var("POWAR_TEST_DIR", "/opt/powar");
        let expanded = expand("$POWAR_TEST_DIR/etc").unwrap();
        assert_eq!(expanded, PathBuf::from("/opt/powar/etc"));
    }

    #[test]
    #[serial]
    fn test_expand_undefined_var_is_error() {
        std::env::remove_var("POWAR_UNDEFINED_VAR");
        assert!(expand("$POWAR_UNDEFINED_VAR/etc").is_err());
    }

    #[test]
    fn test_expand_absolute_rejects_relative() {
        let result = expand_absolute("relative/path");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("needs to be absolute"));
    }

    #[test]
    fn test_expand_plain_absolute_path() {
        let expanded = expand_absolute("/etc/hosts").unwrap();
        assert_eq!(expanded, PathBuf::from("/etc/hosts"));
    }
}
