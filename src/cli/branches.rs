//! `branches` command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::config::{read_config_file, Branch, BranchTopology, ReadOptions};

/// Branches command options.
#[derive(Parser)]
pub struct BranchesCommand {
    /// Branch configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: PathBuf,
}

/// Lookups printed by the command, sorted for stable output.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BranchLookups<'a> {
    branch_by_alias: BTreeMap<&'a str, &'a Branch>,
    branch_name_by_milestone_number: BTreeMap<i64, &'a str>,
}

impl<'a> From<&'a BranchTopology> for BranchLookups<'a> {
    fn from(topology: &'a BranchTopology) -> Self {
        Self {
            branch_by_alias: topology
                .branch_by_alias
                .iter()
                .map(|(alias, branch)| (alias.as_str(), branch))
                .collect(),
            branch_name_by_milestone_number: topology
                .branch_name_by_milestone_number
                .iter()
                .map(|(number, name)| (*number, name.as_str()))
                .collect(),
        }
    }
}

impl BranchesCommand {
    /// Executes the branches command.
    pub fn execute(self) -> Result<()> {
        let topology = read_config_file(&self.config, &ReadOptions::default())?;
        println!("{}", render(&topology)?);
        Ok(())
    }
}

fn render(topology: &BranchTopology) -> Result<String> {
    serde_json::to_string_pretty(&BranchLookups::from(topology))
        .context("Failed to serialize branch lookups")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_sorted_lookups() -> Result<()> {
        let topology = BranchTopology::from_json(
            r#"{
                "branches": {
                    "release-b": { "alias": "b", "milestoneNumber": 20 },
                    "release-a": { "alias": "a", "milestoneNumber": 10 }
                }
            }"#,
            &ReadOptions::default(),
        )?;

        let rendered: serde_json::Value = serde_json::from_str(&render(&topology)?)?;

        assert_eq!(rendered["branchByAlias"]["a"]["name"], "release-a");
        assert_eq!(rendered["branchByAlias"]["b"]["milestoneNumber"], 20);
        assert_eq!(rendered["branchNameByMilestoneNumber"]["10"], "release-a");
        let aliases: Vec<&String> = rendered["branchByAlias"]
            .as_object()
            .map(|map| map.keys().collect())
            .unwrap_or_default();
        assert_eq!(aliases, ["a", "b"]);
        Ok(())
    }
}
