//! Persistence of the last successful run timestamp
//!
//! The cache directory holds a single `last_run` file containing the decimal
//! form of a floating-point Unix timestamp. A missing or empty file means the
//! tool has never completed a run, which the staleness tracker treats as
//! "everything is stale".
//!
//! The cache is constructed per run and owned by it; the value is memoized so
//! every consumer within one pass sees the same timestamp.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults::LAST_RUN_FILENAME;
use crate::error::{Error, Result};

/// File-backed store for the last successful run timestamp.
#[derive(Debug)]
pub struct RunCache {
    cache_dir: PathBuf,
    last_run_path: PathBuf,
    memoized: Cell<Option<f64>>,
}

impl RunCache {
    /// Create a cache rooted at `cache_dir`. Nothing is touched on disk
    /// until the value is first read or written.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            last_run_path: cache_dir.join(LAST_RUN_FILENAME),
            memoized: Cell::new(None),
        }
    }

    /// Read the last run timestamp, returning `0.0` when the backing file is
    /// missing or empty (first run).
    pub fn last_run(&self) -> Result<f64> {
        if let Some(value) = self.memoized.get() {
            return Ok(value);
        }

        let value = match fs::read_to_string(&self.last_run_path) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    0.0
                } else {
                    contents.parse::<f64>().map_err(|_| Error::Cache {
                        message: format!(
                            "{} does not contain a timestamp: {:?}",
                            self.last_run_path.display(),
                            contents
                        ),
                    })?
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0.0,
            Err(e) => {
                return Err(Error::Cache {
                    message: format!("cannot read {}: {}", self.last_run_path.display(), e),
                })
            }
        };

        self.memoized.set(Some(value));
        Ok(value)
    }

    /// Overwrite the stored timestamp, creating the cache directory first if
    /// it does not exist.
    pub fn set_last_run(&self, timestamp: f64) -> Result<()> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| Error::Cache {
            message: format!("cannot create {}: {}", self.cache_dir.display(), e),
        })?;
        fs::write(&self.last_run_path, timestamp.to_string()).map_err(|e| Error::Cache {
            message: format!("cannot write {}: {}", self.last_run_path.display(), e),
        })?;
        self.memoized.set(Some(timestamp));
        Ok(())
    }
}
