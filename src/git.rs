//! Git porcelain commands run through a [`CommandRunner`].
//!
//! Every operation is a plain `git` command line so that dry runs log exactly
//! what would have been executed.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::action::CommandRunner;

/// File the commit message is written to before committing.
pub const COMMIT_MESSAGE_FILE: &str = ".commitmsg";

/// Author override for a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAuthor {
    /// Author name.
    pub name: String,
    /// Author email address.
    pub email: String,
}

impl CommitAuthor {
    /// Creates an author.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Git operations for a working copy.
pub struct Git<R> {
    runner: R,
    workdir: PathBuf,
}

impl<R: CommandRunner> Git<R> {
    /// Runs git through `runner` in the current directory.
    pub fn new(runner: R) -> Self {
        Self::with_workdir(runner, ".")
    }

    /// Runs git through `runner`; `workdir` is where the runner's commands
    /// execute and where the commit message file is written.
    pub fn with_workdir(runner: R, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            workdir: workdir.into(),
        }
    }

    /// Working directory of the repository.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Commits staged changes with `message` and pushes.
    ///
    /// The message goes through a file so it needs no shell quoting.
    pub fn commit(&self, message: &str, author: Option<&CommitAuthor>) -> Result<()> {
        let message_path = self.workdir.join(COMMIT_MESSAGE_FILE);
        fs::write(&message_path, message).with_context(|| {
            format!(
                "Failed to write commit message file: {}",
                message_path.display()
            )
        })?;

        let mut options = format!("--file={COMMIT_MESSAGE_FILE}");
        if let Some(author) = author {
            options.push_str(&format!(" --author \"{} <{}>\"", author.name, author.email));
        }

        self.runner.exec(&format!("git commit {options}"))?;
        self.runner.exec("git push")?;
        Ok(())
    }

    /// Creates branch `name` at `sha` and pushes it to origin.
    pub fn create_branch(&self, name: &str, sha: &str) -> Result<()> {
        let (name, sha) = (quote(name), quote(sha));
        self.runner.exec(&format!("git checkout -b {name} {sha}"))?;
        self.runner
            .exec(&format!("git push --set-upstream origin {name}"))?;
        Ok(())
    }

    /// Deletes remote branch `name`, ignoring failures (e.g. already gone).
    pub fn delete_branch(&self, name: &str) -> Option<String> {
        self.runner
            .exec_quietly(&format!("git push origin --delete {}", quote(name)))
    }

    /// Checks out `branch`.
    pub fn checkout(&self, branch: &str) -> Result<Option<String>> {
        Ok(self.runner.exec(&format!("git checkout {}", quote(branch)))?)
    }

    /// Pulls the current branch.
    pub fn pull(&self) -> Result<Option<String>> {
        Ok(self.runner.exec("git pull")?)
    }

    /// Merges `reference` with extra `options` such as `--no-ff --no-commit`.
    pub fn merge(&self, reference: &str, options: &str) -> Result<Option<String>> {
        let cmd = format!("git merge {} {options}", quote(reference));
        Ok(self.runner.exec(cmd.trim())?)
    }

    /// Resets to `reference`; `mode` defaults to `--hard`.
    pub fn reset(&self, reference: &str, mode: Option<&str>) -> Result<Option<String>> {
        let mode = mode.unwrap_or("--hard");
        Ok(self
            .runner
            .exec(&format!("git reset {mode} {}", quote(reference)))?)
    }

    /// Pushes with optional `args`, e.g. `--force origin my-branch`.
    pub fn push(&self, args: &str) -> Result<Option<String>> {
        let cmd = format!("git push {args}");
        Ok(self.runner.exec(cmd.trim())?)
    }

    /// Sets the identity used for commits in this repository.
    pub fn configure_identity(&self, name: &str, email: &str) -> Result<()> {
        self.runner
            .exec(&format!("git config user.email \"{email}\""))?;
        self.runner.exec(&format!("git config user.name \"{name}\""))?;
        Ok(())
    }
}

/// Quotes a branch name, ref or sha for `sh -c`. Plain names pass unchanged.
fn quote(arg: &str) -> Cow<'_, str> {
    shell_escape::unix::escape(Cow::Borrowed(arg))
}
