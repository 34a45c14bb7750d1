//! Issue number resolution for pull requests.
//!
//! An issue number is looked up in three places, in order of how deliberately
//! each one is written:
//!
//! 1. the commit messages, newest first (`Fixes #12345`),
//! 2. the pull request title (`Fix for #12345`),
//! 3. the source branch name (`issue-12345-fix`).
//!
//! Commit messages and titles need an explicit `#` marker. Branch names are
//! usually generated by tooling, so any run of digits counts there, which is
//! also why they are consulted last. Only runs of three or more ASCII digits
//! match, so short numeric tokens are never taken for an issue.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::github::{PullRequest, PullRequestCommit};

/// Explicit issue reference: `#` followed by three or more digits.
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static ISSUE_REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([0-9]{3,})").unwrap());

/// Bare issue number inside a branch name.
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static BRANCH_ISSUE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{3,})").unwrap());

/// An issue tracker number, kept exactly as written (leading zeros included).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IssueNumber(String);

impl IssueNumber {
    /// Returns the digits of the issue number.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for IssueNumber {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Where an issue number was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSource {
    /// One of the pull request's commit messages.
    Commits,
    /// The pull request title.
    Title,
    /// The pull request's source branch name.
    BranchName,
}

impl IssueSource {
    fn pattern(self) -> &'static Regex {
        match self {
            IssueSource::Commits | IssueSource::Title => &ISSUE_REFERENCE_PATTERN,
            IssueSource::BranchName => &BRANCH_ISSUE_PATTERN,
        }
    }
}

impl fmt::Display for IssueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueSource::Commits => write!(f, "commits"),
            IssueSource::Title => write!(f, "PR title"),
            IssueSource::BranchName => write!(f, "branch name"),
        }
    }
}

/// Supplies the commit messages of a pull request.
///
/// Messages are returned in the order the API lists them: oldest first.
pub trait CommitSource: Send + Sync {
    /// Fetches the commit messages of pull request `pr_number`.
    fn commit_messages<'a>(
        &'a self,
        pr_number: u64,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>>;
}

/// Ordered-source issue number search.
pub struct IssueNumberResolver;

impl IssueNumberResolver {
    /// Resolves the issue number for a pull request.
    ///
    /// `commit_messages` is expected oldest first, as the API returns them;
    /// the newest commit is searched first.
    pub fn resolve<S: AsRef<str>>(
        commit_messages: &[S],
        pr_title: &str,
        source_branch_name: &str,
    ) -> Option<IssueNumber> {
        Self::search_commits(commit_messages)
            .or_else(|| search(pr_title, IssueSource::Title))
            .or_else(|| search(source_branch_name, IssueSource::BranchName))
    }

    /// Searches commit messages only, newest first.
    pub fn search_commits<S: AsRef<str>>(commit_messages: &[S]) -> Option<IssueNumber> {
        debug!(
            commit_messages = ?commit_messages.iter().map(AsRef::as_ref).collect::<Vec<_>>(),
            "Searching commit messages for an issue number"
        );

        commit_messages
            .iter()
            .rev()
            .find_map(|message| search(message.as_ref(), IssueSource::Commits))
    }
}

/// Finds the issue number in a "list commits on a pull request" response.
pub fn extract_from_commits(commits: &[PullRequestCommit]) -> Option<IssueNumber> {
    let messages: Vec<&str> = commits.iter().map(PullRequestCommit::message).collect();
    IssueNumberResolver::search_commits(&messages)
}

/// Fetches the commits of `pull_request` and resolves its issue number.
///
/// Errors from the commit source are returned unchanged; finding nothing is
/// `Ok(None)`.
pub async fn find_issue_number<C>(
    source: &C,
    pull_request: &PullRequest,
) -> Result<Option<IssueNumber>>
where
    C: CommitSource + ?Sized,
{
    let messages = source.commit_messages(pull_request.number).await?;
    Ok(IssueNumberResolver::resolve(
        &messages,
        &pull_request.title,
        &pull_request.head.ref_name,
    ))
}

/// Returns the first issue number in `text` using the pattern for `source`.
fn search(text: &str, source: IssueSource) -> Option<IssueNumber> {
    let digits = source.pattern().captures(text)?.get(1)?.as_str();
    info!(issue_number = digits, %source, "Issue number found");
    Some(IssueNumber(digits.to_string()))
}
