//! A thin wrapper around invoking the system `git` binary as a subprocess,
//! in the spirit of the `GitRunInfo`/`Command` pattern used for Git
//! porcelain invocations elsewhere in the ecosystem: capture stdout/stderr,
//! and surface a non-zero exit as a typed error rather than panicking.
//!
//! The VCS backend uses this for operations that are porcelain-level by
//! nature (`status --porcelain`, `-X theirs` merges, `push`) rather than
//! reimplementing them against `git2`'s plumbing.

use std::path::{Path, PathBuf};
use std::process::Command;

use config_plane_core::ConfigError;
use tracing::{debug, instrument};

/// Runs `git` against a fixed working directory.
#[derive(Clone, Debug)]
pub struct GitRunner {
    path_to_git: PathBuf,
    working_directory: PathBuf,
}

/// Captured result of a `git` invocation that exited zero.
pub struct GitOutput {
    pub stdout: String,
    #[allow(dead_code)]
    pub stderr: String,
}

impl GitRunner {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        GitRunner {
            path_to_git: PathBuf::from("git"),
            working_directory: working_directory.into(),
        }
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Run `git <args>`, treating a non-zero exit as an error.
    #[instrument(skip(self), level = "debug")]
    pub fn run(&self, args: &[&str]) -> Result<GitOutput, ConfigError> {
        debug!(?args, "running git");
        let output = Command::new(&self.path_to_git)
            .args(args)
            .current_dir(&self.working_directory)
            .output()
            .map_err(ConfigError::backend_io)?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ConfigError::backend_io_msg(format!(
                "git {:?} failed (exit {:?}): {}",
                args,
                output.status.code(),
                stderr.trim()
            )));
        }

        Ok(GitOutput { stdout, stderr })
    }

    /// Like [`Self::run`], but on failure returns the captured stderr
    /// instead of an error — for callers (like `merge`) that want to turn
    /// the failure into a domain-specific error of their own.
    pub fn try_run(&self, args: &[&str]) -> Result<GitOutput, String> {
        let output = Command::new(&self.path_to_git)
            .args(args)
            .current_dir(&self.working_directory)
            .output()
            .map_err(|err| err.to_string())?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(GitOutput { stdout, stderr })
        } else {
            Err(stderr.trim().to_string())
        }
    }

    /// Convenience for invocations whose only interesting output is a
    /// single trimmed line of stdout.
    pub fn run_text(&self, args: &[&str]) -> Result<String, ConfigError> {
        Ok(self.run(args)?.stdout.trim().to_string())
    }
}
