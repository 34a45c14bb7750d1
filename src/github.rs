//! GitHub REST access and workflow event context.

pub mod client;
pub mod context;
pub mod error;
pub mod types;

pub use client::{GitHubClient, MAX_PULL_REQUEST_COMMITS, REPO_TOKEN_INPUT};
pub use context::{EventPayload, GitHubContext, DEFAULT_API_URL};
pub use error::GitHubError;
pub use types::{
    CommitDetails, CreatedIssue, GitActor, HeadRef, NewIssue, PullRequest, PullRequestCommit,
    RepoRef,
};
