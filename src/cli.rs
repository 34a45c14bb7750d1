//! CLI interface for release-flow.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod branches;
pub mod issue_number;
pub mod merge_targets;

/// release-flow: release branch automation for GitHub Actions.
#[derive(Parser)]
#[command(name = "release-flow")]
#[command(
    about = "Release branch automation for GitHub Actions",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Finds the issue number a pull request refers to.
    IssueNumber(issue_number::IssueNumberCommand),
    /// Lists the branches a change must be merged forward into.
    MergeTargets(merge_targets::MergeTargetsCommand),
    /// Shows the branch lookups derived from a configuration.
    Branches(branches::BranchesCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::IssueNumber(cmd) => cmd.execute().await,
            Commands::MergeTargets(cmd) => cmd.execute(),
            Commands::Branches(cmd) => cmd.execute(),
        }
    }
}
