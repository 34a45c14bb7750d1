//! # release-flow
//!
//! Release branch automation for GitHub Actions.
//!
//! ## Features
//!
//! - Finds the issue number a pull request refers to, searching its commits,
//!   then its title, then its source branch name
//! - Reads the release branch configuration and derives the forward-merge
//!   chain and alias and milestone lookups
//! - Shell, git and GitHub REST helpers for writing actions
//!
//! ## Quick Start
//!
//! ```rust
//! use release_flow::issue::IssueNumberResolver;
//!
//! let issue = IssueNumberResolver::resolve(
//!     &["Initial import", "#48086 fix the build"],
//!     "Fix the build",
//!     "issue-48086",
//! );
//! assert_eq!(issue.unwrap().as_str(), "48086");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod action;
pub mod cli;
pub mod config;
pub mod git;
pub mod github;
pub mod issue;

pub use crate::cli::Cli;
pub use crate::config::{read_config_file, BranchTopology, ConfigError, ReadOptions};
pub use crate::issue::{find_issue_number, IssueNumber, IssueNumberResolver};

/// The current version of release-flow.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
