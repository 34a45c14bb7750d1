//! `issue-number` command.

use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::debug;

use crate::action::{run, Action, ActionCore, ActionToolkit, GithubCore};
use crate::github::GitHubContext;
use crate::issue::{find_issue_number, IssueNumber, IssueNumberResolver};

/// Issue number command options.
#[derive(Parser)]
pub struct IssueNumberCommand {
    /// Commit message, oldest first. Repeat for each commit.
    #[arg(long = "commit", value_name = "MESSAGE")]
    pub commits: Vec<String>,

    /// Pull request title.
    #[arg(long, default_value = "")]
    pub title: String,

    /// Source branch name.
    #[arg(long, default_value = "")]
    pub branch: String,

    /// Reads the pull request from the workflow event and fetches its
    /// commits with the `repo-token` input.
    #[arg(long, conflicts_with_all = ["commits", "title", "branch"])]
    pub event: bool,

    /// Writes the issue number to this step output instead of printing it.
    #[arg(long, value_name = "NAME")]
    pub output: Option<String>,
}

impl IssueNumberCommand {
    /// Executes the issue-number command.
    pub async fn execute(self) -> Result<()> {
        if self.event {
            return execute_event(self.output).await;
        }

        let issue = IssueNumberResolver::resolve(&self.commits, &self.title, &self.branch);
        emit(
            &GithubCore::from_env().with_stderr_log(),
            &mut io::stdout(),
            issue.as_ref(),
            self.output.as_deref(),
        )
    }
}

async fn execute_event(output: Option<String>) -> Result<()> {
    // Stdout carries only the issue number.
    let core = Arc::new(GithubCore::from_env().with_stderr_log());
    let context = GitHubContext::from_env()?;
    let kit = ActionToolkit::new(core.clone(), context);

    let mut action = FindIssueNumber {
        output,
        out: io::stdout(),
    };
    run(&mut action, &kit).await;

    if core.is_failed() {
        bail!("issue-number action failed");
    }
    Ok(())
}

/// Resolves the issue number of the event's pull request.
struct FindIssueNumber<W> {
    output: Option<String>,
    out: W,
}

impl<W: Write + Send> Action for FindIssueNumber<W> {
    fn run_action<'a>(
        &'a mut self,
        kit: &'a ActionToolkit,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let pull_request = kit
                .github()
                .context()
                .pull_request()
                .context("The workflow event has no pull request")?;

            let issue = find_issue_number(kit, pull_request).await?;
            emit(kit.core(), &mut self.out, issue.as_ref(), self.output.as_deref())
        })
    }
}

/// Writes `issue` to `out`, or to step output `output` when given. Nothing
/// found is not an error and produces nothing.
fn emit(
    core: &dyn ActionCore,
    out: &mut dyn Write,
    issue: Option<&IssueNumber>,
    output: Option<&str>,
) -> Result<()> {
    let Some(issue) = issue else {
        debug!("No issue number found");
        return Ok(());
    };

    match output {
        Some(name) => core.set_output(name, issue.as_str()),
        None => {
            writeln!(out, "{issue}").context("Failed to write the issue number")?;
            Ok(())
        }
    }
}
