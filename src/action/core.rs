//! Inputs, logging and outputs of the CI host.

use std::env;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};

/// Rule printed under a group label.
const GROUP_RULE: &str = "===============================================";

/// Facilities the CI host offers a running action.
pub trait ActionCore: Send + Sync {
    /// Returns the value of action input `name`, or `None` when unset or empty.
    fn get_input(&self, name: &str) -> Option<String>;

    /// Writes an informational line to the job log.
    fn info(&self, message: &str);

    /// Writes a debug line, shown only when step debugging is enabled.
    fn debug(&self, message: &str);

    /// Writes a warning annotation.
    fn warning(&self, message: &str);

    /// Writes an error annotation.
    fn error(&self, message: &str);

    /// Sets step output `name` for later steps.
    fn set_output(&self, name: &str, value: &str) -> Result<()>;

    /// Logs `message` as an error and marks the action as failed.
    fn set_failed(&self, message: &str);

    /// Opens a log group.
    ///
    /// Written as a plain banner: native groups are swallowed when the
    /// action runs through a private action loader.
    fn start_group(&self, label: &str) {
        self.info(&group_banner(label));
    }

    /// Closes the current log group.
    fn end_group(&self) {}
}

/// Banner written by [`ActionCore::start_group`].
pub fn group_banner(label: &str) -> String {
    format!("\n{label}\n{GROUP_RULE}\n")
}

/// Environment variable the runner uses for input `name`.
pub fn input_env_name(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Escapes workflow command data.
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Formats a workflow command such as `::warning::message`.
pub fn format_command(command: &str, message: &str) -> String {
    format!("::{command}::{}", escape_data(message))
}

/// Formats one `GITHUB_OUTPUT` entry using the heredoc form.
pub fn format_output_entry(name: &str, value: &str, delimiter: &str) -> Result<String> {
    if name.contains(delimiter) || value.contains(delimiter) {
        anyhow::bail!("Output '{name}' contains the delimiter {delimiter}");
    }
    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
}

/// [`ActionCore`] backed by the GitHub Actions runner environment.
///
/// Log lines and workflow commands go to stdout unless another writer is
/// set. The runner reads workflow commands from stderr too, so CLI commands
/// that print results on stdout log to stderr.
pub struct GithubCore {
    output_file: Option<PathBuf>,
    failed: AtomicBool,
    log: Mutex<Box<dyn Write + Send>>,
}

impl fmt::Debug for GithubCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubCore")
            .field("output_file", &self.output_file)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl Default for GithubCore {
    fn default() -> Self {
        Self {
            output_file: None,
            failed: AtomicBool::new(false),
            log: Mutex::new(Box::new(io::stdout())),
        }
    }
}

impl GithubCore {
    /// Creates a core that reads the runner's environment.
    pub fn from_env() -> Self {
        Self {
            output_file: env::var_os("GITHUB_OUTPUT")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            ..Self::default()
        }
    }

    /// Writes outputs to `path` instead of `GITHUB_OUTPUT`.
    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Writes log lines and workflow commands to `writer`.
    pub fn with_log_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.log = Mutex::new(Box::new(writer));
        self
    }

    /// Writes log lines and workflow commands to stderr.
    pub fn with_stderr_log(self) -> Self {
        self.with_log_writer(io::stderr())
    }

    /// Whether [`ActionCore::set_failed`] has been called.
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Process exit code matching the action's state.
    pub fn exit_code(&self) -> i32 {
        i32::from(self.is_failed())
    }

    fn log_line(&self, line: &str) {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        // A closed log stream must not fail the action.
        let _ = writeln!(log, "{line}").and_then(|()| log.flush());
    }
}

impl ActionCore for GithubCore {
    fn get_input(&self, name: &str) -> Option<String> {
        env::var(input_env_name(name))
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn info(&self, message: &str) {
        self.log_line(message);
    }

    fn debug(&self, message: &str) {
        self.log_line(&format_command("debug", message));
    }

    fn warning(&self, message: &str) {
        self.log_line(&format_command("warning", message));
    }

    fn error(&self, message: &str) {
        self.log_line(&format_command("error", message));
    }

    fn set_output(&self, name: &str, value: &str) -> Result<()> {
        let Some(path) = &self.output_file else {
            self.log_line("");
            self.log_line(&format!(
                "::set-output name={}::{}",
                escape_data(name),
                escape_data(value)
            ));
            return Ok(());
        };

        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let delimiter = format!("ghadelimiter_{}_{nanos}", std::process::id());
        let entry = format_output_entry(name, value, &delimiter)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open output file: {}", path.display()))?;
        file.write_all(entry.as_bytes())
            .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        Ok(())
    }

    fn set_failed(&self, message: &str) {
        self.failed.store(true, Ordering::SeqCst);
        self.error(message);
    }
}
