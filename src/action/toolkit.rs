//! Shared runtime for actions: logging, shell, git and GitHub access.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::debug;

use super::core::ActionCore;
use super::shell::{display_status, CommandRunner, Shell, ShellError};
use crate::git::{CommitAuthor, Git};
use crate::github::{GitHubClient, GitHubContext, GitHubError, PullRequestCommit, RepoRef};
use crate::issue::CommitSource;

/// Prefix used by [`ActionToolkit::log_error`] when none is given.
pub const DEFAULT_ERROR_PREFIX: &str = "Error Detected";

/// Everything an [`Action`] needs while it runs.
pub struct ActionToolkit {
    core: Arc<dyn ActionCore>,
    shell: Shell,
    git: Git<Shell>,
    gh: GitHubClient,
    commits: Mutex<HashMap<u64, Vec<PullRequestCommit>>>,
}

impl ActionToolkit {
    /// Builds a toolkit around `core` for the run described by `context`.
    pub fn new(core: Arc<dyn ActionCore>, context: GitHubContext) -> Self {
        let shell = Shell::new(core.clone());
        Self {
            git: Git::new(shell.clone()),
            gh: GitHubClient::new(core.clone(), context),
            shell,
            core,
            commits: Mutex::new(HashMap::new()),
        }
    }

    /// The CI host core.
    pub fn core(&self) -> &dyn ActionCore {
        self.core.as_ref()
    }

    /// The shell commands run through.
    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Git operations on the checked-out repository.
    pub fn git(&self) -> &Git<Shell> {
        &self.git
    }

    /// The GitHub client.
    pub fn github(&self) -> &GitHubClient {
        &self.gh
    }

    /// Runs `cmd` in the shell.
    pub fn exec(&self, cmd: &str) -> Result<Option<String>, ShellError> {
        self.shell.exec(cmd)
    }

    /// Runs `cmd` in the shell, discarding any error.
    pub fn exec_quietly(&self, cmd: &str) -> Option<String> {
        self.shell.exec_quietly(cmd)
    }

    /// Calls the GitHub API through `f`.
    ///
    /// `f` receives the client and the run's repository. `args` are logged
    /// at debug level under `label`.
    pub async fn exec_rest<'a, T, A, F, Fut>(&'a self, label: &str, args: &A, f: F) -> Result<T>
    where
        A: Serialize + ?Sized,
        F: FnOnce(&'a GitHubClient, RepoRef) -> Fut,
        Fut: Future<Output = Result<T, GitHubError>>,
    {
        if let Err(GitHubError::MissingToken) = self.gh.http() {
            return Err(anyhow!(
                "GitHub client is not initialized! Did the action specify the required 'repo-token'?"
            ));
        }

        let repo = self.gh.repo()?;
        let args = serde_json::to_string(args).unwrap_or_default();
        self.core
            .debug(&format!("Invoking GitHub REST API {label}: {args}"));
        debug!(label, %repo, %args, "Invoking GitHub REST API");

        f(&self.gh, repo)
            .await
            .with_context(|| format!("GitHub REST call {label} failed"))
    }

    /// Commits of pull request `pr_number`, fetched once per run.
    pub async fn fetch_commits(&self, pr_number: u64) -> Result<Vec<PullRequestCommit>> {
        let cached = self.lock_commits().get(&pr_number).cloned();
        if let Some(commits) = cached {
            debug!(pr_number, "Using cached pull request commits");
            return Ok(commits);
        }

        let args = serde_json::json!({ "pull_number": pr_number });
        let commits = self
            .exec_rest("pulls.listCommits", &args, |gh, _repo| {
                gh.fetch_commits(pr_number)
            })
            .await?;

        self.lock_commits().insert(pr_number, commits.clone());
        Ok(commits)
    }

    /// Commits staged changes and pushes.
    pub fn commit(&self, message: &str, author: Option<&CommitAuthor>) -> Result<()> {
        self.git.commit(message, author)
    }

    /// Creates and pushes branch `name` at `sha`.
    pub fn create_branch(&self, name: &str, sha: &str) -> Result<()> {
        self.git.create_branch(name, sha)
    }

    /// Deletes remote branch `name`, ignoring failures.
    pub fn delete_branch(&self, name: &str) -> Option<String> {
        self.git.delete_branch(name)
    }

    /// Logs `err` as a warning.
    ///
    /// Shell failures add the exit status and captured stdout.
    pub fn log_error(&self, err: &anyhow::Error, prefix: Option<&str>) {
        let prefix = prefix.unwrap_or(DEFAULT_ERROR_PREFIX);
        let (status, stdout) = match err.downcast_ref::<ShellError>() {
            Some(ShellError::Failed { status, stdout, .. }) => {
                (display_status(status), stdout.as_str())
            }
            _ => ("none".to_string(), ""),
        };
        self.core.warning(&format!(
            "{prefix}:\nstatus: {status}\nerror: {err:#}\nstdout: {stdout}"
        ));
    }

    /// Opens a log group.
    pub fn start_group(&self, label: &str) {
        self.core.start_group(label);
    }

    /// Closes the current log group.
    pub fn end_group(&self) {
        self.core.end_group();
    }

    fn lock_commits(&self) -> MutexGuard<'_, HashMap<u64, Vec<PullRequestCommit>>> {
        self.commits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CommitSource for ActionToolkit {
    fn commit_messages<'a>(
        &'a self,
        pr_number: u64,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>> {
        Box::pin(async move {
            let commits = self.fetch_commits(pr_number).await?;
            Ok(commits
                .into_iter()
                .map(|commit| commit.commit.message)
                .collect())
        })
    }
}

/// A unit of work run against an [`ActionToolkit`].
///
/// Implement [`Action::run_action`]; override [`Action::on_error`] to react
/// to failures before (or instead of) failing the step.
pub trait Action: Send {
    /// Performs the action's work.
    fn run_action<'a>(
        &'a mut self,
        kit: &'a ActionToolkit,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Called with any error returned by [`Action::run_action`].
    fn on_error(&mut self, kit: &ActionToolkit, err: &anyhow::Error) {
        report_failure(kit, err);
    }
}

/// Logs `err` as an error and marks the step as failed.
pub fn report_failure(kit: &ActionToolkit, err: &anyhow::Error) {
    kit.core().error(&format!("{err:#}"));
    kit.core().set_failed(&err.to_string());
}

/// Runs `action`, routing any error to [`Action::on_error`].
///
/// The error is never returned; the core records the failure.
pub async fn run<A: Action + ?Sized>(action: &mut A, kit: &ActionToolkit) {
    let result = action.run_action(kit).await;
    if let Err(err) = result {
        debug!("Action failed: {err:#}");
        action.on_error(kit, &err);
    }
}
