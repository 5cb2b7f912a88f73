//! Shell command execution
//!
//! Hooks and inline command substitutions are plain `sh -c` invocations run
//! in a module's directory. Commands are trusted input (they come from the
//! user's own configuration); there is no sandboxing.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Run a shell command in `dir`, inheriting stdio.
///
/// Used for lifecycle hooks, where the command's output should reach the
/// user's terminal directly.
pub fn run(command: &str, dir: &Path) -> Result<()> {
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .status()
        .map_err(|e| Error::Execution {
            command: command.to_string(),
            message: e.to_string(),
        })?;

    if !status.success() {
        return Err(Error::Execution {
            command: command.to_string(),
            message: format!("exited with {}", status),
        });
    }

    Ok(())
}

/// Run a shell command in `dir` and return its stdout.
///
/// Used for command substitution in configuration values. Stderr is captured
/// and reported in the error on failure.
pub fn run_capture(command: &str, dir: &Path) -> Result<String> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::Execution {
            command: command.to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Execution {
            command: command.to_string(),
            message: format!("exited with {}: {}", output.status, stderr.trim_end()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a shell command in `dir` with `input` piped to stdin.
///
/// Used for privileged installs (`sudo tee`), where the file content travels
/// over the pipe rather than through a temp file.
pub fn run_with_stdin(command: &str, dir: &Path, input: &str) -> Result<()> {
    use std::io::Write;

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()
        .map_err(|e| Error::Execution {
            command: command.to_string(),
            message: e.to_string(),
        })?;

    // stdin is piped above, so take() cannot fail
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes())?;
    }

    let status = child.wait().map_err(|e| Error::Execution {
        command: command.to_string(),
        message: e.to_string(),
    })?;

    if !status.success() {
        return Err(Error::Execution {
            command: command.to_string(),
            message: format!("exited with {}", status),
        });
    }

    Ok(())
}
