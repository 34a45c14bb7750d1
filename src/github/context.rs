//! The workflow run's view of GitHub: event payload, repository, API URL.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::error::GitHubError;
use super::types::{PullRequest, RepoRef};

/// Default REST endpoint for github.com.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// The parts of a webhook event payload actions read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    /// Repository the event belongs to.
    #[serde(default)]
    pub repository: Option<RepositoryPayload>,
    /// Pull request, for `pull_request` events.
    #[serde(default)]
    pub pull_request: Option<PullRequest>,
}

/// Repository section of an event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPayload {
    /// Repository name.
    pub name: String,
    /// Repository owner.
    pub owner: OwnerPayload,
}

/// Owner section of a repository payload.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerPayload {
    /// Owner login.
    pub login: String,
}

/// Context of the current workflow run.
#[derive(Debug, Clone)]
pub struct GitHubContext {
    payload: EventPayload,
    repository: Option<String>,
    api_url: String,
}

impl Default for GitHubContext {
    fn default() -> Self {
        Self::from_payload(EventPayload::default())
    }
}

impl GitHubContext {
    /// Loads the context from the runner environment.
    ///
    /// The payload is read from `GITHUB_EVENT_PATH` when it is set.
    pub fn from_env() -> Result<Self> {
        let payload = match env::var_os("GITHUB_EVENT_PATH").filter(|path| !path.is_empty()) {
            Some(path) => Self::load_payload(Path::new(&path))?,
            None => EventPayload::default(),
        };

        let mut context = Self::from_payload(payload);
        context.repository = env::var("GITHUB_REPOSITORY").ok();
        if let Ok(api_url) = env::var("GITHUB_API_URL") {
            if !api_url.is_empty() {
                context.api_url = api_url;
            }
        }
        Ok(context)
    }

    /// Creates a context around an already parsed payload.
    pub fn from_payload(payload: EventPayload) -> Self {
        Self {
            payload,
            repository: None,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Reads an event payload file.
    pub fn load_payload(path: &Path) -> Result<EventPayload> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read event payload: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse event payload: {}", path.display()))
    }

    /// Uses `owner/repo` when the payload names no repository.
    pub fn with_repository(mut self, full_name: impl Into<String>) -> Self {
        self.repository = Some(full_name.into());
        self
    }

    /// Sends API requests to `api_url` instead of the default.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// The event payload.
    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// The pull request the event is about, if any.
    pub fn pull_request(&self) -> Option<&PullRequest> {
        self.payload.pull_request.as_ref()
    }

    /// REST API base URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Repository the run belongs to.
    pub fn repo(&self) -> Result<RepoRef, GitHubError> {
        if let Some(repository) = &self.payload.repository {
            return Ok(RepoRef {
                owner: repository.owner.login.clone(),
                repo: repository.name.clone(),
            });
        }

        self.repository
            .as_deref()
            .and_then(RepoRef::parse)
            .ok_or(GitHubError::MissingRepository)
    }
}
