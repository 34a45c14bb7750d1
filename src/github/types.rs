//! GitHub REST and webhook payload types.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Pull request fields read from a webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PullRequest {
    /// Pull request number.
    pub number: u64,
    /// Pull request title.
    #[serde(default)]
    pub title: String,
    /// Source branch.
    pub head: HeadRef,
}

/// The head (source) side of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HeadRef {
    /// Source branch name.
    #[serde(rename = "ref")]
    pub ref_name: String,
}

/// One entry of the "list commits on a pull request" response.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PullRequestCommit {
    /// Commit SHA.
    #[serde(default)]
    pub sha: String,
    /// Git-level commit data.
    pub commit: CommitDetails,
}

impl PullRequestCommit {
    /// Creates a commit entry carrying only a message.
    pub fn with_message(message: &str) -> Self {
        Self {
            sha: String::new(),
            commit: CommitDetails {
                message: message.to_string(),
                author: None,
            },
        }
    }

    /// Full commit message.
    pub fn message(&self) -> &str {
        &self.commit.message
    }
}

/// Git-level data of a commit.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommitDetails {
    /// Full commit message.
    pub message: String,
    /// Commit author as recorded by git.
    #[serde(default)]
    pub author: Option<GitActor>,
}

/// Author or committer of a git commit.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GitActor {
    /// Name.
    pub name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Authoring date.
    pub date: Option<DateTime<FixedOffset>>,
}

/// An issue to create.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewIssue {
    /// Issue title.
    pub title: String,
    /// Milestone to assign.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
    /// Label names to apply.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// The issue GitHub created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedIssue {
    /// Issue number.
    pub number: u64,
    /// Browser URL of the issue.
    pub html_url: String,
}

/// Owner and name of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    /// Owning user or organisation.
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

impl RepoRef {
    /// Parses `owner/repo`.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, repo) = full_name.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_request_from_event_payload() -> anyhow::Result<()> {
        let pr: PullRequest = serde_json::from_str(
            r#"{
                "number": 48085,
                "title": "Fix login redirect",
                "state": "open",
                "head": { "ref": "issue-48058-fix", "sha": "278fd79" },
                "base": { "ref": "release-2022" }
            }"#,
        )?;
        assert_eq!(pr.number, 48085);
        assert_eq!(pr.title, "Fix login redirect");
        assert_eq!(pr.head.ref_name, "issue-48058-fix");
        Ok(())
    }

    #[test]
    fn commit_list_entry() -> anyhow::Result<()> {
        let commit: PullRequestCommit = serde_json::from_str(
            r#"{
                "sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e",
                "commit": {
                    "message": "Fix all the bugs\n\nFixes #1347",
                    "author": {
                        "name": "Monalisa Octocat",
                        "email": "support@github.com",
                        "date": "2011-04-14T16:00:49Z"
                    }
                }
            }"#,
        )?;
        assert_eq!(commit.message(), "Fix all the bugs\n\nFixes #1347");
        let author = commit.commit.author.unwrap();
        assert_eq!(author.name.as_deref(), Some("Monalisa Octocat"));
        assert!(author.date.is_some());
        Ok(())
    }

    #[test]
    fn new_issue_omits_empty_fields() -> anyhow::Result<()> {
        let issue = NewIssue {
            title: "Merge forward".to_string(),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&issue)?,
            serde_json::json!({ "title": "Merge forward" })
        );
        Ok(())
    }

    #[test]
    fn repo_ref_parse() {
        let repo = RepoRef::parse("octo-org/hello-world").unwrap();
        assert_eq!(repo.owner, "octo-org");
        assert_eq!(repo.repo, "hello-world");
        assert_eq!(repo.to_string(), "octo-org/hello-world");

        assert!(RepoRef::parse("no-slash").is_none());
        assert!(RepoRef::parse("a/b/c").is_none());
        assert!(RepoRef::parse("/repo").is_none());
    }
}
