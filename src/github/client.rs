//! GitHub REST client scoped to the workflow run's repository.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::{Client, Response};
use tracing::{debug, info};
use url::Url;

use super::context::GitHubContext;
use super::error::GitHubError;
use super::types::{CreatedIssue, NewIssue, PullRequestCommit, RepoRef};
use crate::action::ActionCore;
use crate::issue::CommitSource;

/// Input holding the token used for API calls.
pub const REPO_TOKEN_INPUT: &str = "repo-token";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest page GitHub serves for list endpoints.
const MAX_PAGE_SIZE: usize = 100;

/// Most commits the pull request commits endpoint ever lists.
pub const MAX_PULL_REQUEST_COMMITS: usize = 250;

const API_VERSION: &str = "2022-11-28";

/// GitHub REST client.
///
/// The HTTP client is created on first use from the `repo-token` input, so
/// actions that never call the API do not need a token.
pub struct GitHubClient {
    core: Arc<dyn ActionCore>,
    context: GitHubContext,
    http: OnceLock<Client>,
}

impl GitHubClient {
    /// Creates a client bound to `core` (for inputs) and `context`.
    pub fn new(core: Arc<dyn ActionCore>, context: GitHubContext) -> Self {
        Self {
            core,
            context,
            http: OnceLock::new(),
        }
    }

    /// Returns the authenticated HTTP client, creating it on first use.
    pub fn http(&self) -> Result<&Client, GitHubError> {
        if let Some(client) = self.http.get() {
            return Ok(client);
        }

        let token = self
            .core
            .get_input(REPO_TOKEN_INPUT)
            .ok_or(GitHubError::MissingToken)?;
        let client = build_http_client(&token)?;
        Ok(self.http.get_or_init(|| client))
    }

    /// Run context this client reads the repository from.
    pub fn context(&self) -> &GitHubContext {
        &self.context
    }

    /// Repository the run belongs to.
    pub fn repo(&self) -> Result<RepoRef, GitHubError> {
        self.context.repo()
    }

    /// Lists the commits of a pull request, oldest first.
    ///
    /// Follows pagination until a short page or the last page; GitHub lists
    /// at most [`MAX_PULL_REQUEST_COMMITS`] commits.
    pub async fn fetch_commits(
        &self,
        pr_number: u64,
    ) -> Result<Vec<PullRequestCommit>, GitHubError> {
        let repo = self.repo()?;
        let base = self.endpoint(&format!(
            "repos/{}/{}/pulls/{pr_number}/commits",
            repo.owner, repo.repo
        ))?;

        let mut commits = Vec::new();
        for page in 1..=MAX_PULL_REQUEST_COMMITS.div_ceil(MAX_PAGE_SIZE) {
            let mut url = base.clone();
            url.query_pairs_mut()
                .append_pair("per_page", &MAX_PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());

            debug!(%repo, pr_number, %url, "Listing pull request commits");

            let response = check_status(self.http()?.get(url).send().await?).await?;
            let has_next = has_next_page(&response);
            let batch: Vec<PullRequestCommit> = response.json().await?;
            let full_page = batch.len() == MAX_PAGE_SIZE;
            commits.extend(batch);

            if !has_next && !full_page {
                break;
            }
        }

        debug!(commit_count = commits.len(), "Received pull request commits");
        Ok(commits)
    }

    /// Creates an issue.
    pub async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, GitHubError> {
        let repo = self.repo()?;
        let url = self.endpoint(&format!("repos/{}/{}/issues", repo.owner, repo.repo))?;

        info!(%repo, title = %issue.title, milestone = ?issue.milestone, "Creating issue");

        let response = self.http()?.post(url).json(issue).send().await?;
        let created: CreatedIssue = check_status(response).await?.json().await?;

        info!(number = created.number, url = %created.html_url, "Created issue");
        Ok(created)
    }

    fn endpoint(&self, path: &str) -> Result<Url, GitHubError> {
        let base = format!("{}/", self.context.api_url().trim_end_matches('/'));
        Ok(Url::parse(&base)?.join(path)?)
    }
}

impl CommitSource for GitHubClient {
    fn commit_messages<'a>(
        &'a self,
        pr_number: u64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<String>>> + Send + 'a>> {
        Box::pin(async move {
            let commits = self.fetch_commits(pr_number).await?;
            Ok(commits
                .into_iter()
                .map(|commit| commit.commit.message)
                .collect())
        })
    }
}

fn build_http_client(token: &str) -> Result<Client, GitHubError> {
    let mut auth =
        HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| GitHubError::InvalidToken)?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    headers.insert(
        "x-github-api-version",
        HeaderValue::from_static(API_VERSION),
    );

    Ok(Client::builder()
        .user_agent(concat!("release-flow/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// Whether the `Link` header points at a next page.
fn has_next_page(response: &Response) -> bool {
    response
        .headers()
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|link| link.contains("rel=\"next\""))
}

async fn check_status(response: Response) -> Result<Response, GitHubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_else(|e| {
        debug!("Failed to read error response body: {e}");
        String::new()
    });
    Err(GitHubError::Api {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::MockCore;

    fn client(core: MockCore) -> GitHubClient {
        GitHubClient::new(
            Arc::new(core),
            GitHubContext::default().with_repository("test-owner/test-repo"),
        )
    }

    #[test]
    fn missing_token_is_an_error() {
        let gh = client(MockCore::new());
        let err = gh.http().unwrap_err();
        assert!(matches!(err, GitHubError::MissingToken));
        assert_eq!(err.to_string(), "repo-token input is required");
    }

    #[test]
    fn http_client_is_created_once() -> anyhow::Result<()> {
        let gh = client(MockCore::new().with_input("repo-token", "test-token"));
        let first = gh.http()? as *const Client;
        let second = gh.http()? as *const Client;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let gh = client(MockCore::new().with_input("repo-token", "bad\ntoken"));
        assert!(matches!(gh.http().unwrap_err(), GitHubError::InvalidToken));
    }

    #[test]
    fn endpoint_joins_base_url() -> anyhow::Result<()> {
        let gh = GitHubClient::new(
            Arc::new(MockCore::new()),
            GitHubContext::default().with_api_url("https://ghe.example.com/api/v3"),
        );
        let url = gh.endpoint("repos/o/r/issues")?;
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/repos/o/r/issues");
        Ok(())
    }

    #[test]
    fn repo_comes_from_context() -> anyhow::Result<()> {
        let gh = client(MockCore::new());
        let repo = gh.repo()?;
        assert_eq!(repo.owner, "test-owner");
        assert_eq!(repo.repo, "test-repo");
        Ok(())
    }
}
