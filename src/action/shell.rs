//! Shell command execution with dry-run support.

use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use thiserror::Error;

use super::core::ActionCore;

/// Input that turns command execution into logging only.
pub const DRY_RUN_INPUT: &str = "dry-run";

/// Errors from running a shell command.
#[derive(Error, Debug)]
pub enum ShellError {
    /// The shell could not be started.
    #[error("Failed to execute `{cmd}`")]
    Spawn {
        /// Command line that was being run.
        cmd: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The command exited unsuccessfully.
    #[error("`{cmd}` failed with status {}: {stderr}", display_status(.status))]
    Failed {
        /// Command line that was run.
        cmd: String,
        /// Exit code, `None` if terminated by a signal.
        status: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
}

pub(crate) fn display_status(status: &Option<i32>) -> String {
    status.map_or_else(|| "signal".to_string(), |code| code.to_string())
}

/// Runs command lines.
pub trait CommandRunner {
    /// Runs `cmd`, returning its trimmed stdout, or `None` when nothing ran.
    fn exec(&self, cmd: &str) -> Result<Option<String>, ShellError>;

    /// Runs `cmd`, discarding any error.
    fn exec_quietly(&self, cmd: &str) -> Option<String> {
        self.exec(cmd).ok().flatten()
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn exec(&self, cmd: &str) -> Result<Option<String>, ShellError> {
        (**self).exec(cmd)
    }

    fn exec_quietly(&self, cmd: &str) -> Option<String> {
        (**self).exec_quietly(cmd)
    }
}

/// Runs commands through `sh -c`, logging each one to the action core.
#[derive(Clone)]
pub struct Shell {
    core: Arc<dyn ActionCore>,
    current_dir: Option<PathBuf>,
}

impl Shell {
    /// Creates a shell bound to `core`.
    pub fn new(core: Arc<dyn ActionCore>) -> Self {
        Self {
            core,
            current_dir: None,
        }
    }

    /// Runs every command in `dir`.
    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Working directory commands run in, if fixed.
    pub fn current_dir(&self) -> Option<&PathBuf> {
        self.current_dir.as_ref()
    }

    fn is_dry_run(&self) -> bool {
        self.core
            .get_input(DRY_RUN_INPUT)
            .is_some_and(|value| !value.eq_ignore_ascii_case("false"))
    }
}

impl CommandRunner for Shell {
    fn exec(&self, cmd: &str) -> Result<Option<String>, ShellError> {
        if self.is_dry_run() {
            self.core.info(&format!("dry run: {cmd}"));
            return Ok(None);
        }

        self.core.info(&format!("Running: {cmd}"));

        let mut command = Command::new("sh");
        command.arg("-c").arg(cmd);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|source| ShellError::Spawn {
            cmd: cmd.to_string(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(ShellError::Failed {
                cmd: cmd.to_string(),
                status: output.status.code(),
                stdout,
                stderr: stderr.trim().to_string(),
            });
        }

        if !stderr.trim().is_empty() {
            self.core.info(stderr.trim_end());
        }

        Ok(Some(stdout))
    }
}
