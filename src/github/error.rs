//! GitHub API error types.

use thiserror::Error;

/// Errors from GitHub REST calls.
#[derive(Error, Debug)]
pub enum GitHubError {
    /// The action was run without a `repo-token` input.
    #[error("repo-token input is required")]
    MissingToken,

    /// The token cannot be sent as an HTTP header.
    #[error("repo-token contains characters not allowed in an HTTP header")]
    InvalidToken,

    /// Neither the event payload nor `GITHUB_REPOSITORY` names a repository.
    #[error("Repository not found in the event payload or GITHUB_REPOSITORY")]
    MissingRepository,

    /// The API base URL or an endpoint path is invalid.
    #[error("Invalid GitHub API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request could not be sent or the response could not be decoded.
    #[error("GitHub request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// GitHub answered with a non-success status.
    #[error("GitHub API returned HTTP {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },
}
